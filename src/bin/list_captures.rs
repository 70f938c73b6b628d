use std::path::PathBuf;

use chrono::Utc;
use structopt::StructOpt;

use cl31capture::{
    CaptureIndex,
    Site,
};

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
#[structopt(about = "list capture files under a base folder, oldest window first")]
pub struct Mode {
    #[structopt(long, default_value = "./raw", parse(from_os_str))]
    base_folder: PathBuf,

    #[structopt(long, help = "only list files whose window has ended")]
    completed: bool,

    #[structopt(long, help = "only print the most recent file")]
    latest: bool,

    #[structopt(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<String>,

    #[structopt(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<String>,
}

fn main() -> eyre::Result<()> {
    let mode = Mode::from_args();

    let site = match (mode.lat, mode.lon) {
        (Some(lat), Some(lon)) => Some(Site::new(lat, lon)?),
        _ => None,
    };

    let index = CaptureIndex::scan(&mode.base_folder)?;
    let now = Utc::now();

    let mut files = index
        .files()
        .iter()
        .filter(|f| site.as_ref().map_or(true, |site| &f.site == site))
        .filter(|f| !mode.completed || f.is_complete(now))
        .collect::<Vec<_>>();

    if mode.latest {
        files = files.pop().into_iter().collect();
    }

    for file in files {
        println!("{}\t{}\t{}", file.window, file.site, file.path.display());
    }

    Ok(())
}
