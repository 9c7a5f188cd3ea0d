use clap::Args;

use super::url::FilterArgs;
use crate::cli::config::{current_server_url, current_token};
use crate::cli::portal::PortalClient;
use crate::cli::utils::output_list_view;
use crate::cli::OutputFormat;

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    #[arg(long, help = "Sort the page by a column")]
    pub sort: Option<String>,

    #[arg(long, help = "Sort order: asc or desc")]
    pub order: Option<String>,

    #[arg(short = 'q', long = "search", help = "Search within the loaded page")]
    pub search: Option<String>,
}

impl ListArgs {
    pub fn table_params(&self) -> Vec<(String, String)> {
        [("sort", &self.sort), ("order", &self.order), ("q", &self.search)]
            .into_iter()
            .filter_map(|(name, value)| value.as_ref().map(|v| (name.to_string(), v.clone())))
            .collect()
    }
}

pub async fn handle(args: ListArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let location = args.filters.resolve()?;
    let client = PortalClient::new(current_server_url()?, current_token()?);

    tracing::debug!(%location, "loading list view");
    let loaded = client.load(&location, &args.table_params()).await?;
    if loaded.redirected {
        eprintln!("! {} is not available to your role; showing {}", location.path(), loaded.location.path());
    }
    output_list_view(&output_format, &loaded.body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_params_skip_unset_controls() {
        let args = ListArgs {
            filters: FilterArgs::default(),
            sort: Some("name".into()),
            order: None,
            search: Some("ama".into()),
        };
        assert_eq!(
            args.table_params(),
            vec![("sort".to_string(), "name".to_string()), ("q".to_string(), "ama".to_string())]
        );
    }
}
