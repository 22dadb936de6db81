use anyhow::{Context, Result};
use clap::{App, Arg};
use guidepress::build::{build_site, Strategy};
use guidepress::config::Config;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = App::new("guidepress")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generates static buyer's guide pages from a list of topics")
        .arg(
            Arg::with_name("project")
                .long("project")
                .short("p")
                .value_name("DIR")
                .help("The project directory; config.json is searched for here and in its parents")
                .takes_value(true)
                .default_value("."),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .short("c")
                .value_name("FILE")
                .help("An explicit config file; its directory becomes the project directory")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("articles")
                .long("articles")
                .short("n")
                .value_name("N")
                .help("Overrides articles_per_run")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("offline")
                .long("offline")
                .help("Uses the body template even when a generator is configured"),
        )
        .get_matches();

    let mut config = match matches.value_of("config") {
        Some(path) => Config::from_project_file(Path::new(path))?,
        None => Config::from_directory(Path::new(matches.value_of("project").unwrap_or(".")))?,
    };
    if let Some(n) = matches.value_of("articles") {
        config.articles_per_run = n
            .parse()
            .with_context(|| format!("Invalid --articles value `{}`", n))?;
    }
    let strategy = match matches.is_present("offline") {
        true => Strategy::Offline,
        false => Strategy::Auto,
    };

    let report = build_site(&config, strategy)?;
    log::info!(
        "Done: {} written, {} already published, {} failed",
        report.written.len(),
        report.already_published,
        report.failed.len()
    );
    Ok(())
}
