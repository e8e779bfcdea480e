//! `reef`: render a template file into a live tree and print the result.
//!
//! The live tree is seeded from `--live` (empty by default), the template is
//! reconciled into it `--passes` times, and the final markup goes to stdout.
//! Logging is controlled with `RUST_LOG` (e.g. `RUST_LOG=reconcile=debug`).

use std::path::PathBuf;

use clap::Parser;
use dom::LiveDom;
use mimalloc::MiMalloc;
use reconcile::{Delegate, EventDelegate, PatchOptions, patch};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "reef")]
#[command(about = "Reconcile a markup template into a live tree")]
struct Args {
    /// Template markup file
    #[arg(value_name = "TEMPLATE")]
    template: PathBuf,

    /// Markup the live tree starts from
    #[arg(short, long, value_name = "FILE")]
    live: Option<PathBuf>,

    /// Keep inline on* attributes
    #[arg(long)]
    allow_inline_events: bool,

    /// Record on* attributes as delegated event bindings
    #[arg(long, conflicts_with = "allow_inline_events")]
    delegate_events: bool,

    /// Number of reconciliation passes
    #[arg(long, default_value_t = 1)]
    passes: u32,

    /// Print the mutation journal to stderr
    #[arg(short, long)]
    journal: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| -> Box<dyn std::error::Error> { e })?;

    let template_markup = std::fs::read_to_string(&args.template)?;
    let live_markup = match &args.live {
        Some(path) => std::fs::read_to_string(path)?,
        None => String::new(),
    };

    let mut dom = LiveDom::from_markup(&live_markup);
    if args.journal {
        dom.enable_journal();
    }
    let root = dom.root();
    let template = html::build(&template_markup);
    let mut delegate = args.delegate_events.then(EventDelegate::new);

    for pass in 1..=args.passes {
        let options = PatchOptions {
            allow_inline_events: args.allow_inline_events,
            delegate: delegate.as_mut().map(|d| d as &mut dyn Delegate),
        };
        let stats = patch(&template, &mut dom, root, options)?;
        log::info!("pass {pass}: {stats}");
        if args.journal {
            for mutation in dom.take_mutations() {
                eprintln!("pass {pass}: {mutation:?}");
            }
        }
    }

    if let Some(delegate) = &delegate {
        for binding in delegate.bindings() {
            eprintln!("bound {} on {} -> {}", binding.event, binding.node, binding.handler);
        }
    }
    println!("{}", dom.inner_html(root)?);
    Ok(())
}
