use std::sync::Arc;

use clap::Args;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::url::FilterArgs;
use crate::api::RequestTracker;
use crate::cli::config::{current_server_url, current_token};
use crate::cli::portal::{LoadedView, PortalClient};
use crate::cli::utils::output_list_view;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::filter::{DebouncedSearch, FilterKey, FilterPatch, Location, Navigator, QueryCodec};

#[derive(Args, Debug, Clone)]
pub struct BrowseArgs {
    #[command(flatten)]
    pub filters: FilterArgs,
}

const HELP: &str = "\
Type to search by name (debounced). Commands:
  :set <key> <value>   set a filter        :unset <key>   remove a filter
  :next  :prev         change page         :clear         drop every filter
  :back  :fwd          history             :sort <col> [asc|desc]
  :quit";

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Search(String),
    Set(FilterKey, String),
    Unset(FilterKey),
    Next,
    Prev,
    Back,
    Forward,
    Clear,
    Sort(String, Option<String>),
    Help,
    Quit,
}

/// Page moves the last loaded view allows. Nothing is allowed until a view
/// has loaded, and each new request forgets the previous answer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Paging {
    has_next: bool,
    has_previous: bool,
}

impl Paging {
    fn from_body(body: &Value) -> Self {
        let pagination = &body["table"]["pagination"];
        Self {
            has_next: pagination["has_next_page"].as_bool().unwrap_or(false),
            has_previous: pagination["has_previous_page"].as_bool().unwrap_or(false),
        }
    }

    /// Target page for a move, or `None` at either end.
    fn step(&self, page: u32, forward: bool) -> Option<u32> {
        match forward {
            true if self.has_next => Some(page + 1),
            false if self.has_previous && page > 1 => Some(page - 1),
            _ => None,
        }
    }
}

fn parse_input(line: &str) -> anyhow::Result<Input> {
    let Some(command) = line.strip_prefix(':') else {
        return Ok(Input::Search(line.to_string()));
    };
    let mut words = command.split_whitespace();
    let key = |name: Option<&str>| {
        name.and_then(FilterKey::from_query_name)
            .ok_or_else(|| anyhow::anyhow!("expected a filter key"))
    };
    Ok(match words.next().unwrap_or_default() {
        "set" => {
            let k = key(words.next())?;
            let value = words.collect::<Vec<_>>().join(" ");
            Input::Set(k, value)
        }
        "unset" => Input::Unset(key(words.next())?),
        "next" | "n" => Input::Next,
        "prev" | "p" => Input::Prev,
        "back" | "b" => Input::Back,
        "fwd" | "f" => Input::Forward,
        "clear" => Input::Clear,
        "sort" => {
            let column = words.next().ok_or_else(|| anyhow::anyhow!("expected a column name"))?;
            Input::Sort(column.to_string(), words.next().map(str::to_string))
        }
        "help" | "h" | "?" => Input::Help,
        "quit" | "q" => Input::Quit,
        other => anyhow::bail!("unknown command ':{}'", other),
    })
}

pub async fn handle(args: BrowseArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let start = args.filters.resolve()?;
    let codec = QueryCodec::for_location(&start)?;
    let mut nav = Navigator::at(codec.view(), start)?;

    let client = Arc::new(PortalClient::new(current_server_url()?, current_token()?));
    let tracker = Arc::new(RequestTracker::new());
    let (loaded_tx, mut loaded_rx) = mpsc::unbounded_channel::<anyhow::Result<LoadedView>>();

    let initial_name = nav.state().get(FilterKey::Name).map(str::to_string);
    let (search, mut commits) = DebouncedSearch::spawn(initial_name, config().search.window());

    let mut table: Vec<(String, String)> = Vec::new();
    let mut paging = Paging::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    eprintln!("{}", HELP);
    request(&client, &tracker, &loaded_tx, nav.current(), &table);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = match parse_input(line.trim_end()) {
                    Ok(input) => input,
                    Err(e) => {
                        eprintln!("! {}", e);
                        continue;
                    }
                };

                let page = nav.state().page();
                let moved = match input {
                    Input::Search(text) => {
                        search.input(text);
                        false
                    }
                    Input::Set(key, value) => {
                        nav.update(&FilterPatch::new().set(key, value));
                        true
                    }
                    Input::Unset(key) => {
                        nav.update(&FilterPatch::new().clear(key));
                        true
                    }
                    Input::Next | Input::Prev => {
                        let forward = matches!(input, Input::Next);
                        match paging.step(page, forward) {
                            Some(target) => {
                                nav.update(&FilterPatch::new().page(target));
                                true
                            }
                            None => {
                                eprintln!("! no {} page", if forward { "next" } else { "previous" });
                                false
                            }
                        }
                    }
                    Input::Back => nav.back(),
                    Input::Forward => nav.forward(),
                    Input::Clear => {
                        nav.clear();
                        true
                    }
                    Input::Sort(column, order) => {
                        table = vec![("sort".to_string(), column)];
                        if let Some(order) = order {
                            table.push(("order".to_string(), order));
                        }
                        true
                    }
                    Input::Help => {
                        eprintln!("{}", HELP);
                        false
                    }
                    Input::Quit => break,
                };

                if moved {
                    search.external_change(nav.state().get(FilterKey::Name));
                    paging = Paging::default();
                    request(&client, &tracker, &loaded_tx, nav.current(), &table);
                }
            }
            Some(patch) = commits.recv() => {
                nav.update(&patch);
                paging = Paging::default();
                request(&client, &tracker, &loaded_tx, nav.current(), &table);
            }
            Some(loaded) = loaded_rx.recv() => match loaded {
                Ok(loaded) => {
                    if loaded.redirected {
                        eprintln!("! {} is not available to your role", nav.current().path());
                        let codec = QueryCodec::for_location(&loaded.location)?;
                        nav = Navigator::at(codec.view(), loaded.location)?;
                    }
                    paging = Paging::from_body(&loaded.body);
                    output_list_view(&output_format, &loaded.body)?;
                }
                Err(e) => eprintln!("! {}", e),
            },
        }
    }

    Ok(())
}

/// Load `location` in the background. Only the newest request's result is
/// delivered.
fn request(
    client: &Arc<PortalClient>,
    tracker: &Arc<RequestTracker>,
    loaded: &mpsc::UnboundedSender<anyhow::Result<LoadedView>>,
    location: &Location,
    table: &[(String, String)],
) {
    let client = Arc::clone(client);
    let tracker = Arc::clone(tracker);
    let loaded = loaded.clone();
    let location = location.clone();
    let table = table.to_vec();
    // taken here so issue order, not task scheduling, decides which is newest
    let ticket = tracker.begin();
    tokio::spawn(async move {
        let result = client.load(&location, &table).await;
        if let Some(result) = tracker.settle(ticket, result) {
            let _ = loaded.send(result);
        }
    });
}
