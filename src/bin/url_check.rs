use std::env;

use toolbox_ui::core::video_type::{classify, validate_for_download, video_id};
use toolbox_ui::utils::{init_tracing, validate_url};

fn main() {
    init_tracing(Some("warn"));

    let urls: Vec<String> = env::args().skip(1).collect();
    if urls.is_empty() {
        eprintln!("Usage: url-check <url> [url...]");
        std::process::exit(1);
    }

    let mut rejected = 0;
    for url in &urls {
        if !print_report(url) {
            rejected += 1;
        }
    }

    if rejected > 0 {
        std::process::exit(2);
    }
}

fn print_report(url: &str) -> bool {
    println!("URL: {url}");

    if let Err(error) = validate_url(url) {
        println!("  Error: {error}");
        return false;
    }

    match classify(url) {
        Some(video_type) => println!("  Type: {:?}", video_type),
        None => println!("  Type: unrecognized"),
    }
    if let Some(id) = video_id(url) {
        println!("  Video id: {id}");
    }

    match validate_for_download(url) {
        Ok(_) => {
            println!("  Downloadable: yes");
            true
        }
        Err(error) => {
            println!("  Downloadable: no ({error})");
            false
        }
    }
}
