use dayassist::assistant::{self, AssistantClient, QuickAction};
use dayassist::config::AppConfig;
use dayassist::core::task::Task;
use dayassist::sanitize::{escape_html, preview};
use dayassist::settings::{Settings, Theme};
use dayassist::storage::DirStore;
use dayassist::store::Store;

const HISTORY_LIMIT: usize = 10;
const NOTE_PREVIEW: usize = 40;
const HISTORY_PREVIEW: usize = 30;

const USAGE: &str = "\
usage: dayassist [--debug] <command>

  tasks                     list tasks
  task add <text>           add a task
  task done <id>            toggle a task's completion
  task rm <id>              delete a task
  notes                     list notes
  note add <text>           add a note
  note rm <id>              delete a note
  note ask <id>             ask the assistant to summarize a note
  history                   show recent chats
  history clear             delete all chat history
  history ask <id>          send an earlier prompt again
  chat <message>            ask the assistant
  quick <action>            summarize | brainstorm | generate | schedule | analyze
  context                   print the context sent with each chat
  export                    print tasks and notes as HTML
  config key [<value>]      set (or clear) the API key
  config theme <light|dark|toggle>
  config debug <on|off>     persist the debug logging default
  config test               check the API key against the server
  config show";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let debug_flag = args.iter().any(|a| a == "--debug");
    args.retain(|a| a != "--debug");

    let config = AppConfig::load();
    dayassist::set_debug_logging(debug_flag || config.debug_logging);
    init_logging()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(config, args))
}

/// Log to the systemd user journal (`journalctl --user -t dayassist -f`).
/// Our crate logs at info (debug when enabled), everything else at warn.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("dayassist") {
                let max = if dayassist::debug_logging() {
                    log::LevelFilter::Debug
                } else {
                    log::LevelFilter::Info
                };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    let journal = systemd_journal_logger::JournalLog::new()?
        .with_syslog_identifier("dayassist".to_string());
    log::set_boxed_logger(Box::new(FilteredJournal { inner: journal }))?;
    log::set_max_level(log::LevelFilter::Debug);
    Ok(())
}

async fn run(config: AppConfig, args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let backend = DirStore::open(&config.data_directory)?;
    let mut store = Store::new(backend);
    for err in store.load() {
        eprintln!("warning: {}", err);
    }

    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        [] | ["help"] | ["--help"] | ["-h"] => println!("{}", USAGE),

        ["tasks"] => print_tasks(store.tasks(), store.pending_task_count()),
        ["task", "add", text @ ..] => {
            let task = store.add_task(&text.join(" "))?;
            println!("Added task {} [{}] {}", task.id, task.category, task.priority);
        }
        ["task", "done", id] => {
            let id = parse_id(id)?;
            store.toggle_task_completion(id);
            match store.task(id) {
                Some(task) if task.completed => println!("Completed: {}", task.text),
                Some(task) => println!("Reopened: {}", task.text),
                None => println!("No task {}", id),
            }
        }
        ["task", "rm", id] => store.remove_task(parse_id(id)?),

        ["notes"] => {
            if store.notes().is_empty() {
                println!("No notes yet.");
            }
            for note in store.notes() {
                println!("{:>14}  {}", note.id, preview(&note.text, NOTE_PREVIEW));
            }
        }
        ["note", "add", text @ ..] => {
            let note = store.add_note(&text.join(" "))?;
            println!("Added note {}", note.id);
        }
        ["note", "rm", id] => store.remove_note(parse_id(id)?),
        ["note", "ask", id] => {
            let id = parse_id(id)?;
            let client = client_for(&config, &store)?;
            match assistant::summarize_note(&client, &mut store, id).await? {
                Some(reply) => println!("{}", reply),
                None => println!("No note {}", id),
            }
        }

        ["history"] => {
            if store.history().is_empty() {
                println!("No chat history yet.");
            }
            for entry in store.recent_history(HISTORY_LIMIT) {
                println!(
                    "{:>14}  {}  {}",
                    entry.id,
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    preview(&entry.prompt, HISTORY_PREVIEW)
                );
            }
        }
        ["history", "clear"] => {
            store.clear_history();
            println!("Chat history cleared.");
        }
        ["history", "ask", id] => {
            let id = parse_id(id)?;
            let client = client_for(&config, &store)?;
            match assistant::resend_history(&client, &mut store, id).await? {
                Some(reply) => println!("{}", reply),
                None => println!("No history entry {}", id),
            }
        }

        ["chat", message @ ..] => ask(&config, &mut store, &message.join(" ")).await?,
        ["quick", name] => {
            let action = QuickAction::from_name(name)
                .ok_or_else(|| format!("unknown quick action {:?}", name))?;
            ask(&config, &mut store, action.prompt()).await?;
        }
        ["context"] => println!("{}", assistant::build_context(store.tasks(), store.notes())),
        ["export"] => print!("{}", render_html(&store)),

        ["config", "key"] => {
            let mut settings = Settings::load(store.backend())?;
            settings.clear_api_key(store.backend_mut())?;
            println!("API key cleared.");
        }
        ["config", "key", value] => {
            let mut settings = Settings::load(store.backend())?;
            settings.set_api_key(store.backend_mut(), value)?;
            println!("API key saved.");
        }
        ["config", "theme", value] => {
            let mut settings = Settings::load(store.backend())?;
            let theme = match *value {
                "toggle" => settings.theme.toggled(),
                other => Theme::parse(other).ok_or_else(|| format!("unknown theme {:?}", other))?,
            };
            settings.set_theme(store.backend_mut(), theme)?;
            println!("Theme: {}", theme.as_str());
        }
        ["config", "debug", value] => {
            let mut config = config.clone();
            config.debug_logging = match *value {
                "on" => true,
                "off" => false,
                other => return Err(format!("expected on or off, got {:?}", other).into()),
            };
            config.save_to(&AppConfig::config_path())?;
            println!("Debug logging {}.", value);
        }
        ["config", "test"] => {
            let settings = Settings::load(store.backend())?;
            AssistantClient::new(&config, settings.api_key)
                .test_api_key()
                .await?;
            println!("API key valid.");
        }
        ["config", "show"] => {
            let settings = Settings::load(store.backend())?;
            println!("data directory: {}", store.backend().root().display());
            println!("model:          {}", config.model);
            println!("api key:        {}", if settings.has_api_key() { "set" } else { "not set" });
            println!("theme:          {}", settings.theme.as_str());
        }

        _ => {
            eprintln!("{}", USAGE);
            return Err("unrecognized command".into());
        }
    }

    Ok(())
}

fn client_for(
    config: &AppConfig,
    store: &Store<DirStore>,
) -> Result<AssistantClient, Box<dyn std::error::Error>> {
    let settings = Settings::load(store.backend())?;
    if !settings.has_api_key() {
        println!("Set an API key first: dayassist config key <key>");
    }
    Ok(AssistantClient::new(config, settings.api_key))
}

async fn ask(
    config: &AppConfig,
    store: &mut Store<DirStore>,
    message: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = client_for(config, store)?;
    let reply = assistant::chat(&client, store, message).await?;
    println!("{}", reply);
    Ok(())
}

fn parse_id(s: &str) -> Result<i64, String> {
    s.parse().map_err(|_| format!("invalid id {:?}", s))
}

fn print_tasks(tasks: &[Task], pending: usize) {
    if tasks.is_empty() {
        println!("No tasks yet.");
        return;
    }
    for task in tasks {
        println!(
            "{:>14}  [{}] {} {:<8} {}",
            task.id,
            if task.completed { "x" } else { " " },
            task.priority,
            task.category.as_str(),
            task.text
        );
    }
    println!("{} pending of {}", pending, tasks.len());
}

fn render_html(store: &Store<DirStore>) -> String {
    let mut html = String::from("<ul class=\"tasks\">\n");
    for task in store.tasks() {
        html.push_str(&format!(
            "  <li class=\"task{}\" data-task-id=\"{}\"><span class=\"category\">{}</span> <span class=\"priority\">{}</span> {}</li>\n",
            if task.completed { " completed" } else { "" },
            task.id,
            task.category,
            task.priority,
            escape_html(&task.text)
        ));
    }
    html.push_str("</ul>\n<ul class=\"notes\">\n");
    for note in store.notes() {
        html.push_str(&format!(
            "  <li class=\"note\" data-note-id=\"{}\" title=\"{}\">{}</li>\n",
            note.id,
            escape_html(&note.text),
            escape_html(&preview(&note.text, NOTE_PREVIEW))
        ));
    }
    html.push_str("</ul>\n");
    html
}
