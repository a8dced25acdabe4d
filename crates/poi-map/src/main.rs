use std::{error::Error, path::PathBuf};

use clap::Parser;
use poi_map::{
    App, Config,
    bbox::BboxMode,
    geocode::NominatimClient,
    map::HeadlessMap,
    overpass::OverpassClient,
    store::JsonDirStore,
    types::AddressQuery,
};

mod shell;

#[derive(Parser)]
#[command(version, about = "Browse OpenStreetMap points of interest around an address")]
struct Cli {
    /// Read configuration from <FILE> (JSON).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keep the session in <DIR> so the next start can restore it.
    #[arg(short, long, value_name = "DIR")]
    store_dir: Option<PathBuf>,

    /// Timeout for every network request.
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Side of the query box around the location.
    #[arg(long, value_name = "METRES", conflicts_with = "viewport")]
    side: Option<f64>,

    /// Query what the map viewport shows instead of a fixed box.
    #[arg(long)]
    viewport: bool,

    #[arg(long)]
    country: Option<String>,

    #[arg(long)]
    city: Option<String>,

    #[arg(long)]
    street: Option<String>,

    #[arg(long)]
    postalcode: Option<String>,
}

impl Cli {
    fn config(&self) -> Result<Config, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => Config::from_path(path)?,
            None => Config::default(),
        };

        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(side) = self.side {
            config.bbox = BboxMode::Centered { side };
        }
        if self.viewport {
            config.bbox = BboxMode::Viewport;
        }

        config.validate()?;
        Ok(config)
    }

    /// Address given on the command line, if any.
    fn address(&self) -> Option<AddressQuery> {
        let query = AddressQuery::from_fields(
            AddressQuery::FIELDS
                .into_iter()
                .zip([&self.country, &self.city, &self.street, &self.postalcode])
                .filter_map(|(field, value)| value.as_deref().map(|value| (field, value))),
        );
        (!query.is_empty()).then_some(query)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;

    let config = cli.config()?;
    log::debug!("Using config {config:?}");

    let geocoder = NominatimClient::new(&config)?;
    let source = OverpassClient::new(&config)?;
    let mut app = App::new(config, geocoder, source, HeadlessMap::default())
        .with_notifier(shell::ConsoleNotifier);
    if let Some(dir) = &cli.store_dir {
        app = app.with_store(JsonDirStore::open(dir)?);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match app.load_location(cli.address()).await {
            Ok(report) => shell::print_report(&report),
            Err(err) => log::error!("Could not load location: {err}"),
        }
        shell::run(&mut app).await
    })?;

    Ok(())
}
