use vergen::{
    vergen,
    Config,
};

fn main() {
    if let Err(e) = vergen(Config::default()) {
        eprintln!("vergen failed: {}", e);
    }
}
