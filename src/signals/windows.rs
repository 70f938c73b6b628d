use std::{
    future::Future,
    io,
};

pub fn terminated() -> io::Result<impl Future<Output = ()>> {
    let mut ctrl_c = tokio::signal::windows::ctrl_c()?;

    Ok(async move {
        ctrl_c.recv().await;
        tracing::info!("received ctrl-c");
    })
}
