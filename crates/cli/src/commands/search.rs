use anyhow::{Context, Result, bail};
use querydesk_search::{
    BufferCatalog, Navigator, ResultSet, SearchConfig, SearchEngine, SearchOptions,
};
use querydesk_workspace::{Session, Workspace, render_panel};

use crate::SearchArgs;
use crate::config::{SearchSettings, load_search_settings};

pub fn run(args: &SearchArgs) {
    let settings = load_search_settings();
    match execute(args, settings) {
        Ok(panel) => print!("{panel}"),
        Err(error) => {
            eprintln!("{error:#}");
            std::process::exit(1);
        }
    }
}

fn options(args: &SearchArgs) -> SearchOptions {
    SearchOptions {
        case_sensitive: args.case_sensitive,
        whole_word: args.whole_word,
        use_regex: args.regex,
        include_deleted: !args.exclude_closed,
    }
}

fn execute(args: &SearchArgs, settings: SearchSettings) -> Result<String> {
    let workspace = Session::load(&args.session)
        .and_then(|session| {
            session.into_workspace(settings.closed_tab_retention, settings.max_tabs)
        })
        .with_context(|| format!("could not open session {}", args.session.display()))?;

    let results = search_workspace(&workspace, &args.query, &options(args), settings);
    log::debug!(
        "{} matches for {:?} in {}",
        results.total_match_count,
        args.query,
        args.session.display()
    );
    if let Some(error) = &results.error
        && error.is_user_visible()
    {
        bail!("{}", error.message());
    }

    let mut navigator = Navigator::new();
    navigator.rebuild(&results);
    Ok(render_panel(&results, &navigator, None))
}

fn search_workspace(
    workspace: &Workspace,
    query: &str,
    options: &SearchOptions,
    settings: SearchSettings,
) -> ResultSet {
    let catalog = BufferCatalog::new(settings.closed_tab_retention);
    let snapshot = catalog.snapshot(workspace);
    let mut engine = SearchEngine::new(SearchConfig {
        max_matches: settings.max_matches,
    });
    engine.run(&snapshot, query, options)
}
