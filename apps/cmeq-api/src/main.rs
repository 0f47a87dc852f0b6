use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = cmeq_api::Args::parse();

	cmeq_api::run(args).await
}
