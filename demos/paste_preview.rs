use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use link_preview_card::{CardConfig, LinkPreviewCard, RenderModel, ThemeClass};
use std::error::Error;
use std::time::Duration;

/// Paste links into a preview card from the command line.
#[derive(Parser)]
#[command(name = "paste_preview")]
struct Args {
    /// Links to paste, one after another
    #[arg(required = true)]
    links: Vec<String>,

    /// Metadata service endpoint (defaults to LINK_PREVIEW_ENDPOINT or the public service)
    #[arg(long)]
    endpoint: Option<String>,

    /// Extra institutional domain for the institution theme
    #[arg(long)]
    institution: Vec<String>,
}

fn print_card(link: &str, model: &RenderModel) {
    if !model.card_visible {
        println!("{}: {}", "Hidden".bold().yellow(), link);
        return;
    }

    let theme = match model.theme_class {
        ThemeClass::InstitutionTheme => "institution".bold().blue(),
        ThemeClass::SourceTheme => "source".bold().magenta(),
        ThemeClass::Default => "default".bold().white(),
    };

    println!("\n{}", "Link Preview".bold().green());
    println!("{}", "---------------".green());
    if let Some(title) = &model.body.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(description) = &model.body.description {
        println!("{}: {}", "Description".bold(), description);
    }
    if let Some(image) = &model.body.image_url {
        println!("{}: {}", "Image".bold(), image);
    }
    if let Some(url) = &model.body.canonical_url {
        println!("{}: {}", "Link".bold(), url);
    }
    println!("{}: {} ({})", "Theme".bold(), theme, model.theme_style());
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut config = CardConfig::from_env();
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    config.institution_domains.extend(args.institution);

    let mut card = LinkPreviewCard::mount(config)?;

    for link in &args.links {
        let Some(ticket) = card.on_paste(link) else {
            print_card(link, &card.render());
            continue;
        };

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        spinner.set_message(format!("Fetching {}", ticket.link));
        spinner.enable_steady_tick(Duration::from_millis(80));

        let event = card.fetch_future(ticket).await;
        card.apply(event);
        spinner.finish_and_clear();

        let model = card.render();
        print_card(link, &model);
        if let Some(e) = card.state().last_error() {
            eprintln!("{}: {} - {}", "Error".bold().red(), link, e);
        }
    }

    Ok(())
}
