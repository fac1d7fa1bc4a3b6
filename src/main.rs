use anyhow::{anyhow, Context};
use aztro_chart::zodiac::{fallback_horoscope, sign_for_date};
use aztro_chart::{
    resolve_house, AstrologyClient, BirthFacts, BirthTime, CalculationState, ClientConfig,
    ClockTime, Gender, HouseCusps,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Optional TOML config file; `AZTRO_*` variables override it.
    #[arg(short, long, env = "AZTRO_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sun sign for a birth date, computed locally.
    Sign {
        /// YYYY-MM-DD
        date: NaiveDate,
    },
    /// House containing a longitude, from twelve cusps or an equal-house ascendant.
    House {
        #[arg(long, allow_hyphen_values = true)]
        longitude: f64,
        /// Twelve comma separated cusp degrees, house 1 first.
        #[arg(long, value_delimiter = ',', conflicts_with = "ascendant")]
        cusps: Option<Vec<f64>>,
        #[arg(long)]
        ascendant: Option<f64>,
    },
    /// Natal chart from the astrology service.
    Chart(PersonArgs),
    /// Transit predictions from the astrology service.
    Predict(PersonArgs),
    /// Place search for a birth-place field.
    Places { query: String },
}

#[derive(Args, Debug)]
struct PersonArgs {
    /// YYYY-MM-DD
    #[arg(long)]
    date: NaiveDate,
    /// HH:MM; leave out when unknown
    #[arg(long)]
    time: Option<ClockTime>,
    #[arg(long, default_value = "")]
    place: String,
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    lng: Option<f64>,
    #[arg(long, default_value = "other")]
    gender: String,
    #[arg(long)]
    name: Option<String>,
}

impl PersonArgs {
    fn facts(&self) -> BirthFacts {
        let time = self.time.map(BirthTime::Known).unwrap_or(BirthTime::Unknown);
        BirthFacts {
            name: self.name.clone(),
            latitude: self.lat,
            longitude: self.lng,
            ..BirthFacts::new(self.date, time, self.place.clone(), Gender::from_label(&self.gender))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    match cli.command {
        Command::Sign { date } => {
            let record = sign_for_date(date);
            println!("{:#?}", record);
            println!("{}", fallback_horoscope(date));
        }
        Command::House { longitude, cusps, ascendant } => {
            let cusps = match (cusps, ascendant) {
                (Some(degrees), _) => {
                    let degrees: [f64; 12] = degrees
                        .try_into()
                        .map_err(|d: Vec<f64>| anyhow!("expected 12 cusps, got {}", d.len()))?;
                    HouseCusps::from_degrees(degrees)?
                }
                (None, Some(ascendant)) => HouseCusps::equal(ascendant)?,
                (None, None) => return Err(anyhow!("pass --cusps or --ascendant")),
            };
            let house = resolve_house(longitude, &cusps)?;
            println!("House {}: {}", house, house.meaning());
        }
        Command::Chart(person) => {
            let client = client(cli.config.as_deref())?;
            let facts = person.facts();
            let mut state = CalculationState::default();
            client.run_birth_chart(&mut state, &facts).await;
            match state {
                CalculationState::Succeeded(chart) => println!("{:#?}", chart),
                CalculationState::Failed(e) => {
                    eprintln!("Error: {}", e);
                    eprintln!("{}", fallback_horoscope(facts.date));
                    std::process::exit(1);
                }
                other => return Err(anyhow!("calculation did not finish: {:?}", other)),
            }
        }
        Command::Predict(person) => {
            let client = client(cli.config.as_deref())?;
            match client.calculate_predictions(&person.facts()).await {
                Ok(predictions) => println!("{:#?}", predictions),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Places { query } => {
            let client = client(cli.config.as_deref())?;
            for place in client.search_places(&query).await {
                println!("{}  ({:.4}, {:.4})", place.label, place.latitude, place.longitude);
            }
        }
    }

    Ok(())
}

fn client(config_path: Option<&str>) -> anyhow::Result<AstrologyClient> {
    let config = ClientConfig::load(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    Ok(AstrologyClient::new(config)?)
}
