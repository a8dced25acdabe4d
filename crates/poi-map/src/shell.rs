use std::{fmt::Display, str::FromStr};

use poi_map::{
    App, LoadReport, LoadSource,
    geocode::Geocode,
    map::{HeadlessMap, MapSurface, MarkerId, Selection},
    notify::{Notice, Notifier},
    overpass::PoiSource,
    types::AddressQuery,
};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
commands:
  search <phrase>         show only markers whose name contains <phrase>
  layer <name> on|off     show or hide a layer
  select <marker-id>      select a marker, or unselect it when already selected
  collapse <layer>        expand or collapse a layer's marker list
  list                    print layers and markers
  load key=value ...      load a new address (country, city, street, postalcode)
  where                   print the current location
  help                    print this text
  quit                    leave";

/// Prints notices on stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        eprintln!("{notice}");
    }
}

#[derive(Debug, PartialEq)]
enum Command {
    Search(String),
    Layer { name: String, active: bool },
    Select(MarkerId),
    Collapse(String),
    List,
    Load(AddressQuery),
    Where,
    Help,
    Quit,
}

#[derive(Debug, PartialEq)]
struct ParseCommandError(String);

impl Display for ParseCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (try 'help')", self.0)
    }
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
        let rest = rest.trim();

        let missing = |what: &str| ParseCommandError(format!("'{verb}' needs {what}"));

        match verb {
            "search" => Ok(Self::Search(rest.to_owned())),
            "layer" => {
                let (name, state) = rest
                    .rsplit_once(char::is_whitespace)
                    .ok_or_else(|| missing("a layer name and on|off"))?;
                let active = match state {
                    "on" => true,
                    "off" => false,
                    other => {
                        return Err(ParseCommandError(format!(
                            "expected on|off, got '{other}'"
                        )));
                    }
                };
                Ok(Self::Layer {
                    name: name.trim().to_owned(),
                    active,
                })
            }
            "select" if !rest.is_empty() => Ok(Self::Select(MarkerId::from(rest))),
            "select" => Err(missing("a marker id")),
            "collapse" if !rest.is_empty() => Ok(Self::Collapse(rest.to_owned())),
            "collapse" => Err(missing("a layer name")),
            "list" => Ok(Self::List),
            "load" => {
                let fields = address_fields(rest);
                Ok(Self::Load(AddressQuery::from_fields(
                    fields.iter().map(|(field, value)| (*field, value.as_str())),
                )))
            }
            "where" => Ok(Self::Where),
            "help" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(ParseCommandError(format!("unknown command '{other}'"))),
        }
    }
}

/// Splits `key=value ...` where values may contain spaces: a value runs up to
/// the next token starting with a known field name and `=`.
fn address_fields(args: &str) -> Vec<(&str, String)> {
    let mut fields: Vec<(&str, String)> = Vec::new();
    for token in args.split_whitespace() {
        let field = token.split_once('=').filter(|(key, _)| {
            AddressQuery::FIELDS.iter().any(|field| field == key) || *key == "postal_code"
        });
        if let Some((key, value)) = field {
            fields.push((key, value.to_owned()));
            continue;
        }
        match fields.last_mut() {
            Some((_, value)) => {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(token);
            }
            None => log::debug!("Ignoring '{token}' before the first address field"),
        }
    }
    fields
}

/// Reads commands from stdin until `quit` or end of input.
pub async fn run<G, S>(app: &mut App<G, S, HeadlessMap>) -> std::io::Result<()>
where
    G: Geocode,
    S: PoiSource,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };

        match command {
            Command::Search(phrase) => {
                let matching = app.search_markers(&phrase);
                println!("{matching} markers match '{phrase}'");
            }
            Command::Layer { name, active } => match app.set_layer_active(&name, active) {
                Ok(_) => print_layers(app),
                Err(err) => eprintln!("{err}"),
            },
            Command::Select(id) => match app.toggle_marker(&id) {
                Ok(Selection::Selected(id)) => {
                    if let Some(marker) = app.state().marker(&id) {
                        println!("selected {}", marker.popup().replace('\n', " - "));
                    }
                }
                Ok(Selection::Unselected(id)) => println!("unselected {id}"),
                Err(err) => eprintln!("{err}"),
            },
            Command::Collapse(layer) => match app.toggle_list(&layer) {
                Ok(_) => print_layers(app),
                Err(err) => eprintln!("{err}"),
            },
            Command::List => print_layers(app),
            Command::Load(query) => match app.load_location(Some(query)).await {
                Ok(report) => print_report(&report),
                Err(err) => log::error!("Could not load location: {err}"),
            },
            Command::Where => match app.location() {
                Some(location) => println!("{location}"),
                None => println!("no location loaded"),
            },
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }

    Ok(())
}

pub fn print_report(report: &LoadReport) {
    let how = match report.source {
        LoadSource::Geocoded => "fetched",
        LoadSource::Restored => "restored",
    };
    println!("{how} {} markers in {} layers", report.markers, report.layers);
    for poi_type in &report.failed {
        println!("  missing {poi_type}");
    }
}

fn print_layers<G, S>(app: &App<G, S, HeadlessMap>)
where
    G: Geocode,
    S: PoiSource,
{
    for layer in app.state().layers() {
        let shown = if app.map().has_layer(layer.name()) { 'x' } else { ' ' };
        println!("[{shown}] {}", layer.info());
        if layer.is_collapsed() {
            continue;
        }
        for marker in layer.markers().iter().filter(|marker| marker.is_active()) {
            let mark = if marker.is_selected() { '>' } else { '-' };
            println!("    {mark} {:<14} {}", marker.id().as_str(), marker.name());
        }
    }
}
