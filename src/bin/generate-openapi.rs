use std::env;
use std::path::PathBuf;

use hardhat::generate_openapi_json;

fn main() {
    let args: Vec<String> = env::args().collect();

    let output_path = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("openapi.json")
    };

    match generate_openapi_json(&output_path) {
        Ok(_) => {
            println!("OpenAPI specification generated at {}", output_path.display());
        },
        Err(e) => {
            eprintln!("Error generating OpenAPI specification: {}", e);
            std::process::exit(1);
        },
    }
}
