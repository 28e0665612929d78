use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, CustomType, Select, Text};
use skycast_core::{Config, Preferences, Report, Target, Unit, WeatherService};
use tracing::debug;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Current weather and forecasts for any place")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show weather for a place, explicit coordinates, or your current position.
    Show {
        /// Place name; omit to use your current position.
        place: Option<String>,

        #[command(flatten)]
        coords: CoordinateArgs,

        /// Mark the target as a substituted default location.
        #[arg(long)]
        not_found: bool,

        /// Number of hourly entries to print.
        #[arg(long, default_value_t = render::DEFAULT_HOURS)]
        hours: usize,

        /// Print the snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show or change the display unit.
    Unit {
        /// "metric", "imperial" or "toggle".
        value: Option<String>,
    },

    /// Manage saved locations.
    #[command(subcommand)]
    Saved(SavedCommand),

    /// Interactively edit the configuration.
    Configure,

    /// Print where configuration and preferences are stored.
    ConfigPath,
}

#[derive(Debug, Subcommand)]
pub enum SavedCommand {
    /// List saved locations.
    List,

    /// Save a place by name or coordinates.
    Add {
        place: Option<String>,

        #[command(flatten)]
        coords: CoordinateArgs,
    },

    /// Remove a saved location by id.
    Remove { id: String },

    /// Show weather for a saved location.
    Show {
        id: String,

        #[arg(long, default_value_t = render::DEFAULT_HOURS)]
        hours: usize,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct CoordinateArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Display name for the coordinates.
    #[arg(long)]
    pub name: Option<String>,
}

impl CoordinateArgs {
    /// Coordinates win when both are given; otherwise `place`, then `--name`.
    fn target(&self, place: Option<String>, not_found: bool) -> Target {
        match Target::from_params(self.lat, self.lon, self.name.clone(), not_found) {
            Target::Current | Target::Name(_) if place.is_some() => {
                Target::from_params(None, None, place, not_found)
            }
            target => target,
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Show { place, coords, not_found, hours, json } => {
                let config = Config::load()?;
                let prefs = load_preferences()?;
                let service = WeatherService::from_config(&config)?;

                let report = service.report(&coords.target(place, not_found)).await;
                print_report(&report, prefs.unit, hours, json)?;
            }
            Command::Unit { value } => {
                let mut prefs = load_preferences()?;
                match value.as_deref() {
                    None => {}
                    Some("toggle") => {
                        prefs.toggle_unit();
                        save_preferences(&prefs)?;
                    }
                    Some(v) => {
                        prefs.unit = Unit::try_from(v)?;
                        save_preferences(&prefs)?;
                    }
                }
                println!("{} ({}, {})", prefs.unit, prefs.unit.temperature_symbol(), prefs.unit.wind_symbol());
            }
            Command::Saved(cmd) => cmd.run().await?,
            Command::Configure => configure()?,
            Command::ConfigPath => {
                println!("config:      {}", Config::config_file_path()?.display());
                println!("preferences: {}", Config::preferences_file_path()?.display());
            }
        }

        Ok(())
    }
}

impl SavedCommand {
    async fn run(self) -> Result<()> {
        let mut prefs = load_preferences()?;

        match self {
            SavedCommand::List => println!("{}", render::saved_list(&prefs.saved_locations)),
            SavedCommand::Add { place, coords } => {
                let target = coords.target(place, false);
                if target == Target::Current {
                    bail!("Give a place name or both --lat and --lon to save a location.");
                }

                let config = Config::load()?;
                let service = WeatherService::from_config(&config)?;
                let resolution = service.resolve(&target).await;
                if let Some(notice) = &resolution.notice {
                    bail!("{}", render::notice(notice));
                }

                let location = resolution.location;
                match prefs.add_saved_location(location.name.clone(), location.coordinate) {
                    Some(saved) => println!("Saved {} as {}", saved.name, saved.id),
                    None => {
                        println!("{} is already saved.", location.name);
                        return Ok(());
                    }
                }
                save_preferences(&prefs)?;
            }
            SavedCommand::Remove { id } => match prefs.remove_saved_location(&id) {
                Some(removed) => {
                    save_preferences(&prefs)?;
                    println!("Removed {}", removed.name);
                }
                None => bail!("No saved location with id {id}"),
            },
            SavedCommand::Show { id, hours, json } => {
                let saved = prefs
                    .find_by_id(&id)
                    .with_context(|| format!("No saved location with id {id}"))?;

                let target = Target::Coordinates {
                    coordinate: saved.coordinate(),
                    name: Some(saved.name.clone()),
                    not_found: false,
                };

                let config = Config::load()?;
                let service = WeatherService::from_config(&config)?;
                let report = service.report(&target).await;
                print_report(&report, prefs.unit, hours, json)?;
            }
        }

        Ok(())
    }
}

fn print_report(report: &Report, unit: Unit, hours: usize, json: bool) -> Result<()> {
    debug!("resolved via {:?}", report.resolution.source);

    if let Some(notice) = &report.resolution.notice {
        eprintln!("{}", render::notice(notice));
    }
    if report.snapshot.synthetic {
        eprintln!("{}", render::SYNTHETIC_BANNER);
    }

    if json {
        let mut snapshot = report.snapshot.clone();
        snapshot.hourly.truncate(hours);
        let out = serde_json::to_string_pretty(&snapshot)
            .context("Failed to serialize weather snapshot")?;
        println!("{out}");
    } else {
        println!("{}", render::snapshot(&report.snapshot, unit, hours));
    }

    Ok(())
}

fn load_preferences() -> Result<Preferences> {
    Preferences::load_from(&Config::preferences_file_path()?)
}

fn save_preferences(prefs: &Preferences) -> Result<()> {
    prefs.save_to(&Config::preferences_file_path()?)
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;
    let mut prefs = load_preferences()?;

    let start = Unit::all().iter().position(|u| *u == prefs.unit).unwrap_or(0);
    prefs.unit = Select::new("Display unit:", Unit::all().to_vec())
        .with_starting_cursor(start)
        .prompt()
        .context("Unit selection cancelled")?;

    config.geolocation.enabled = Confirm::new("Allow locating you by IP address?")
        .with_default(config.geolocation.enabled)
        .prompt()
        .context("Geolocation prompt cancelled")?;

    let change_default = Confirm::new(&format!(
        "Default location is {}. Change it?",
        config.default_location.name
    ))
    .with_default(false)
    .prompt()
    .context("Default location prompt cancelled")?;

    if change_default {
        let name = Text::new("Default location name:")
            .with_default(&config.default_location.name)
            .prompt()
            .context("Name prompt cancelled")?;
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_default(config.default_location.latitude)
            .with_error_message("Please enter a number")
            .prompt()
            .context("Latitude prompt cancelled")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_default(config.default_location.longitude)
            .with_error_message("Please enter a number")
            .prompt()
            .context("Longitude prompt cancelled")?;

        config.default_location.name = name;
        config.default_location.latitude = latitude;
        config.default_location.longitude = longitude;
        config.validate()?;
    }

    config.save()?;
    save_preferences(&prefs)?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skycast_core::Coordinate;

    #[test]
    fn show_parses_coordinate_flags() {
        let cli = Cli::try_parse_from([
            "skycast", "show", "--lat", "-33.86", "--lon", "151.2", "--name", "Sydney",
        ])
        .unwrap();

        let Command::Show { place, coords, not_found, hours, json } = cli.command else {
            panic!("expected show");
        };
        assert_eq!(hours, render::DEFAULT_HOURS);
        assert!(!json);
        assert_eq!(
            coords.target(place, not_found),
            Target::Coordinates {
                coordinate: Coordinate::new(-33.86, 151.2),
                name: Some("Sydney".into()),
                not_found: false,
            }
        );
    }

    #[test]
    fn half_a_coordinate_means_current_position() {
        let cli = Cli::try_parse_from(["skycast", "show", "--lat", "10"]).unwrap();
        let Command::Show { place, coords, not_found, .. } = cli.command else {
            panic!("expected show");
        };
        assert_eq!(coords.target(place, not_found), Target::Current);
    }

    #[test]
    fn place_argument_is_a_name_target() {
        let cli = Cli::try_parse_from(["skycast", "show", "Samarqand"]).unwrap();
        let Command::Show { place, coords, not_found, .. } = cli.command else {
            panic!("expected show");
        };
        assert_eq!(coords.target(place, not_found), Target::Name("Samarqand".into()));
    }

    #[test]
    fn saved_subcommands_parse() {
        let cli = Cli::try_parse_from(["skycast", "saved", "remove", "1700000000000"]).unwrap();
        assert!(matches!(cli.command, Command::Saved(SavedCommand::Remove { id }) if id == "1700000000000"));
    }
}
