use clap::Args;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::filter::{FilterError, FilterKey, FilterPatch, Location, QueryCodec, ViewKind};

/// Where to start and which filter changes to apply. Shared by `list`,
/// `browse` and `url`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(help = "View: cells, fellowships, workers, churches")]
    pub view: Option<ViewKind>,

    #[arg(long, help = "Start from an existing location, e.g. '/d/cells?church=3&page=2'")]
    pub from: Option<String>,

    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub church: Option<String>,
    #[arg(long)]
    pub fellowship: Option<String>,
    #[arg(long)]
    pub cell: Option<String>,
    #[arg(long)]
    pub department: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub country: Option<String>,

    #[arg(long = "clear", value_name = "KEY", help = "Remove a filter (repeatable)")]
    pub clear: Vec<String>,

    #[arg(long = "clear-all", help = "Drop every filter before applying changes")]
    pub clear_all: bool,

    #[arg(long)]
    pub page: Option<u32>,
}

impl FilterArgs {
    /// The location the command starts from: `--from`, or the view's bare path.
    pub fn start(&self) -> anyhow::Result<Location> {
        match (&self.from, self.view) {
            (Some(href), view) => {
                let location = Location::parse(href)?;
                let codec = QueryCodec::for_location(&location)?;
                if let Some(view) = view.filter(|v| *v != codec.view()) {
                    return Err(FilterError::WrongView { view, path: location.path().to_string() }.into());
                }
                Ok(location)
            }
            (None, Some(view)) => Ok(Location::new(view.path(), None)),
            (None, None) => anyhow::bail!("Pass a view (cells, fellowships, workers, churches) or --from <location>"),
        }
    }

    /// Collect the requested changes, rejecting keys the view does not carry.
    pub fn patch(&self, view: ViewKind) -> Result<FilterPatch, FilterError> {
        let mut patch = FilterPatch::new();
        let sets = [
            (FilterKey::Name, &self.name),
            (FilterKey::Church, &self.church),
            (FilterKey::Fellowship, &self.fellowship),
            (FilterKey::Cell, &self.cell),
            (FilterKey::Department, &self.department),
            (FilterKey::Gender, &self.gender),
            (FilterKey::Status, &self.status),
            (FilterKey::Phone, &self.phone),
            (FilterKey::Country, &self.country),
        ];
        for (key, value) in sets {
            if let Some(value) = value {
                ensure_accepted(view, key)?;
                patch.insert(key, Some(value.clone()));
            }
        }
        for name in &self.clear {
            let key = FilterKey::from_query_name(name.trim())
                .ok_or_else(|| FilterError::InvalidLocation(format!("unknown filter '{}'", name)))?;
            ensure_accepted(view, key)?;
            patch.insert(key, None);
        }
        if let Some(page) = self.page {
            patch = patch.page(page);
        }
        Ok(patch)
    }

    /// Start location with every change applied through the cascade.
    pub fn resolve(&self) -> anyhow::Result<Location> {
        let start = self.start()?;
        let codec = QueryCodec::for_location(&start)?;
        let patch = self.patch(codec.view())?;
        let base = if self.clear_all { codec.clear(&start) } else { start };
        if patch.is_empty() && self.clear_all {
            return Ok(base);
        }
        Ok(codec.resolve_and_update(&base, &patch))
    }
}

fn ensure_accepted(view: ViewKind, key: FilterKey) -> Result<(), FilterError> {
    if view.accepts(key) {
        Ok(())
    } else {
        Err(FilterError::UnsupportedKey { view, key })
    }
}

#[derive(Args, Debug, Clone)]
pub struct UrlArgs {
    #[command(flatten)]
    pub filters: FilterArgs,
}

pub fn handle(args: UrlArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let location = args.filters.resolve()?;
    match output_format {
        OutputFormat::Json => {
            let state = QueryCodec::for_location(&location)?.read(&location);
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "location": location, "state": state }))?
            );
        }
        OutputFormat::Text => println!("{}", location),
    }
    Ok(())
}
