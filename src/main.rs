use clap::{Args, Parser, Subcommand};
use guard_checkout::application::controller::CheckoutController;
use guard_checkout::config::{CheckoutConfig, ConfigArgs};
use guard_checkout::domain::flow::{CheckoutFlow, FormField};
use guard_checkout::domain::ports::SharedPaymentGateway;
use guard_checkout::domain::quote::TimeOfDay;
use guard_checkout::domain::tier::ServiceTier;
use guard_checkout::error::CheckoutError;
use guard_checkout::infrastructure::simulated::{SimulatedBehaviour, SimulatedGateway};
use guard_checkout::interfaces::csv::quote_reader::QuoteReader;
use guard_checkout::interfaces::csv::quote_writer::QuoteWriter;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Price a single booking and print the confirmation summary
    Quote {
        #[command(flatten)]
        form: FormArgs,

        #[command(flatten)]
        config: ConfigArgs,

        /// Print the quote as JSON
        #[arg(long)]
        json: bool,
    },
    /// Price every booking in a CSV file
    Batch {
        /// Input CSV with email, tier, start, end and optional flag columns
        input: PathBuf,
    },
    /// Run a full checkout against a simulated payment provider
    Checkout {
        #[command(flatten)]
        form: FormArgs,

        #[command(flatten)]
        config: ConfigArgs,

        /// How the simulated customer responds to the payment interface
        #[arg(long, value_enum, default_value_t = SimulatedBehaviour::Approve)]
        outcome: SimulatedBehaviour,
    },
}

#[derive(Args)]
struct FormArgs {
    /// Contact email for the booking
    #[arg(long, default_value = "")]
    email: String,

    /// Security tier: Basic, Intermediate or Advanced
    #[arg(long, default_value = "Basic")]
    tier: ServiceTier,

    /// Start time, HH:MM
    #[arg(long, default_value = "06:00")]
    start: TimeOfDay,

    /// End time, HH:MM
    #[arg(long, default_value = "18:00")]
    end: TimeOfDay,

    /// Dangerous location surcharge
    #[arg(long)]
    dangerous: bool,

    /// Adverse weather surcharge
    #[arg(long)]
    weather: bool,

    /// Emergency response (Advanced only)
    #[arg(long)]
    emergency: bool,

    /// Special equipment (Advanced only)
    #[arg(long)]
    special_equipment: bool,
}

impl FormArgs {
    fn into_fields(self) -> Vec<FormField> {
        vec![
            FormField::Email(self.email),
            FormField::Tier(self.tier),
            FormField::Start(self.start),
            FormField::End(self.end),
            FormField::DangerousLocation(self.dangerous),
            FormField::AdverseWeather(self.weather),
            FormField::Emergency(self.emergency),
            FormField::SpecialEquipment(self.special_equipment),
        ]
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "guard_checkout=warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Command::Quote { form, config, json } => quote(form, config, json),
        Command::Batch { input } => batch(input),
        Command::Checkout {
            form,
            config,
            outcome,
        } => checkout(form, config, outcome).await,
    }
}

fn quote(form: FormArgs, config: ConfigArgs, json: bool) -> Result<()> {
    let config = CheckoutConfig::try_from(config).into_diagnostic()?;
    let mut flow = CheckoutFlow::new(&config);
    for field in form.into_fields() {
        flow.update_field(field).into_diagnostic()?;
    }

    if let Err(e) = flow.request_quote() {
        return match e {
            CheckoutError::Validation(message) => {
                println!("{message}");
                Ok(())
            }
            other => Err(other).into_diagnostic(),
        };
    }

    let Some(summary) = flow.summary() else {
        return Ok(());
    };
    if json {
        let snapshot = flow.snapshot();
        let body = serde_json::json!({ "summary": summary, "quote": snapshot.quote });
        println!("{}", serde_json::to_string_pretty(&body).into_diagnostic()?);
    } else {
        println!("{summary}");
        let card = flow.request().tier.rate_card();
        println!("Additional Charges:");
        for label in card.surcharge_labels(&config.currency) {
            println!("  {label}");
        }
        if flow.shows_advanced_options() {
            println!("Advanced Options:");
            for label in card.flat_fee_labels(&config.currency) {
                println!("  {label}");
            }
        }
    }
    Ok(())
}

fn batch(input: PathBuf) -> Result<()> {
    let file = File::open(input).into_diagnostic()?;
    let reader = QuoteReader::new(file);
    let stdout = io::stdout();
    let mut writer = QuoteWriter::new(stdout.lock());

    let requests = reader.requests().filter_map(|result| match result {
        Ok(request) => Some(request),
        Err(e) => {
            eprintln!("Error reading quote request: {}", e);
            None
        }
    });
    writer.write_requests(requests).into_diagnostic()?;
    Ok(())
}

async fn checkout(form: FormArgs, config: ConfigArgs, outcome: SimulatedBehaviour) -> Result<()> {
    let config = CheckoutConfig::try_from(config).into_diagnostic()?;
    let currency = config.currency.clone();
    let gateway: SharedPaymentGateway = Arc::new(SimulatedGateway::new(outcome));
    let controller = CheckoutController::spawn(config, gateway);

    for field in form.into_fields() {
        controller.update_field(field).await.into_diagnostic()?;
    }

    match controller.request_quote().await {
        Ok(total) => println!("Total Amount: {total} {currency}"),
        Err(CheckoutError::Validation(message)) => {
            println!("{message}");
            return Ok(());
        }
        Err(e) => return Err(e).into_diagnostic(),
    }

    let payment = controller.confirm_payment().await.into_diagnostic()?;
    println!("Payment started: {}", payment.reference);

    let done = controller.wait_for_terminal().await.into_diagnostic()?;
    if let Some(notice) = done.notice {
        println!("{notice}");
    }
    Ok(())
}
