use super::*;

#[test]
fn parses_categories_command() {
    let cli = Cli::try_parse_from(["carta", "categories"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Categories));
}

#[test]
fn category_wait_defaults_to_thirty_seconds() {
    let cli = Cli::try_parse_from(["carta", "category", "7"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Category { ref id, wait_secs: 30 } if id == "7"
    ));
}

#[test]
fn menu_accepts_wait_override() {
    let cli = Cli::try_parse_from(["carta", "menu", "--wait-secs", "5"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Menu { wait_secs: 5 }));
}

#[test]
fn products_requires_a_category() {
    assert!(Cli::try_parse_from(["carta", "products"]).is_err());
    let cli = Cli::try_parse_from(["carta", "products", "3"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Products { ref category_id } if category_id == "3"
    ));
}

#[test]
fn product_takes_category_and_product_ids() {
    let cli =
        Cli::try_parse_from(["carta", "product", "2", "9"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Product { ref category_id, ref product_id, .. }
            if category_id == "2" && product_id == "9"
    ));
}

#[test]
fn add_with_size() {
    let cli = Cli::try_parse_from(["carta", "add", "2", "9", "--size", "Grande"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Add { size: Some(ref s), .. } if s == "Grande"
    ));
}

#[test]
fn add_without_size_is_accepted_by_the_parser() {
    let cli = Cli::try_parse_from(["carta", "add", "2", "9"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Add { size: None, .. }));
}

#[test]
fn missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["carta"]).is_err());
}
