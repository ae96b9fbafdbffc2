use anyhow::Result;

mod app;
mod logging;

fn main() -> Result<()> {
    let args = h5strip::cli::parse();
    app::run(args)
}
