use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    salesdeck::example_apps::run_viewer_cli(std::env::args().skip(1))
}
