//! Fetches CloudFront's edge IP ranges and prints them, one per line.
//!
//! An optional JSON configuration file can be passed as the first argument.

use std::{env, fs, process::ExitCode};

use cloudfront_proxy_ips::{CloudFrontProvider, Config, ProxyIpProvider as _};

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = match env::args().nth(1) {
        Some(path) => {
            let doc = fs::read_to_string(&path).unwrap();
            serde_json::from_str::<Config>(&doc).unwrap()
        }
        None => Config::default(),
    };

    let provider = CloudFrontProvider::from_config(config).unwrap();
    let report = provider.fetch_ranges(None);

    for range in &report.ranges {
        println!("{range}");
    }

    for err in &report.errors {
        tracing::error!("{err}");
    }

    if report.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
