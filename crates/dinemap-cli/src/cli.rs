//! Command-line definition and argument conversion

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dinemap_core::{Bounds, CategoryField, FilterConfig, LatLon, Selector};

/// Build the `dinemap` command
pub(crate) fn command() -> Command {
    Command::new("dinemap")
        .version(dinemap_engine::VERSION)
        .about("Restaurant map dashboard, headless")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_name("FILE")
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .global(true)
                .value_name("URL")
                .help("SPARQL query endpoint"),
        )
        .arg(
            Arg::new("graph")
                .long("graph")
                .global(true)
                .value_name("IRI")
                .help("Named graph to query"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .value_name("FILTER")
                .help("Log filter, overrides RUST_LOG (default: info)"),
        )
        .subcommand(show_command())
        .subcommand(
            Command::new("stats")
                .about("Print the statistics panels")
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("options")
                .about("Print the option list of a selector")
                .arg(
                    Arg::new("selector")
                        .required(true)
                        .value_parser(parse_selector)
                        .help("country, city, price, cuisine, meal, feature or award"),
                )
                .arg(json_flag()),
        )
}

fn show_command() -> Command {
    let mut show = Command::new("show")
        .about("Load every restaurant, apply filters and print the visible markers");

    for field in CategoryField::ALL {
        show = show.arg(
            Arg::new(field.name())
                .long(field.name())
                .value_name("VALUE")
                .help(format!("Only restaurants whose {} is VALUE", field.name())),
        );
    }

    show.arg(flag("gluten-free", "Only gluten-free options"))
        .arg(flag("vegan", "Only vegan options"))
        .arg(flag("vegetarian", "Only vegetarian friendly"))
        .arg(flag("chain", "Only chains"))
        .arg(
            Arg::new("min-rating")
                .long("min-rating")
                .value_name("RATING")
                .default_value("0")
                .value_parser(value_parser!(f64))
                .help("Minimum average rating, inclusive"),
        )
        .arg(
            Arg::new("bbox")
                .long("bbox")
                .value_name("SOUTH,WEST,NORTH,EAST")
                .value_parser(parse_bbox)
                .help("Restrict to a viewport"),
        )
        .arg(json_flag())
}

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).action(ArgAction::SetTrue).help(help)
}

fn json_flag() -> Arg {
    flag("json", "Output as JSON")
}

fn parse_selector(value: &str) -> Result<CategoryField, String> {
    value.parse()
}

/// Parse `south,west,north,east`
pub(crate) fn parse_bbox(value: &str) -> Result<Bounds, String> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("'{p}': {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    let [south, west, north, east] = parts[..] else {
        return Err(format!("expected 4 comma-separated numbers, got {}", parts.len()));
    };
    let corner = |lat, lon| LatLon::new(lat, lon).map_err(|e| e.to_string());
    Ok(Bounds::from_corners(corner(south, west)?, corner(north, east)?))
}

/// Filter configuration from `show` arguments
pub(crate) fn filter_from_args(args: &ArgMatches) -> FilterConfig {
    let mut config = FilterConfig::new();
    for field in CategoryField::ALL {
        if let Some(value) = args.get_one::<String>(field.name()) {
            *config.selector_mut(field) = Selector::parse(value);
        }
    }
    config.gluten_free = args.get_flag("gluten-free");
    config.vegan = args.get_flag("vegan");
    config.vegetarian = args.get_flag("vegetarian");
    config.chain_only = args.get_flag("chain");
    config.min_rating = args.get_one::<f64>("min-rating").copied().unwrap_or(0.0);
    config.in_view = args.contains_id("bbox");
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn show(args: &[&str]) -> ArgMatches {
        let matches = command()
            .try_get_matches_from(["dinemap", "show"].iter().chain(args))
            .unwrap();
        matches.subcommand_matches("show").unwrap().clone()
    }

    #[test]
    fn command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn no_flags_is_reset_state() {
        assert_eq!(filter_from_args(&show(&[])), FilterConfig::default());
    }

    #[test]
    fn flags_map_onto_filter() {
        let config = filter_from_args(&show(&[
            "--cuisine",
            "Italian",
            "--country",
            "Italy",
            "--vegan",
            "--min-rating",
            "4",
            "--bbox",
            "45,9,46,10",
        ]));

        assert_eq!(config.cuisine.value(), Some("Italian"));
        assert_eq!(config.country.value(), Some("Italy"));
        assert!(config.vegan);
        assert!(!config.gluten_free);
        assert_eq!(config.min_rating, 4.0);
        assert!(config.in_view);
    }

    #[test]
    fn bbox_rejects_bad_input() {
        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_bbox("a,2,3,4").is_err());
        assert!(parse_bbox("95,0,96,1").is_err());

        let bounds = parse_bbox("46, 10, 45, 9").unwrap();
        assert_eq!(bounds.south_west.lat, 45.0);
        assert_eq!(bounds.north_east.lon, 10.0);
    }

    #[test]
    fn unknown_selector_is_rejected() {
        let result = command().try_get_matches_from(["dinemap", "options", "stars"]);
        assert!(result.is_err());
    }
}
