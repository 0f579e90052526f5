use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::Parser;
use studio_core::{find_language, update, AppState, Mode, Msg};
use studio_engine::{
    export_gallery, select_renderer, AtomicFileWriter, EngineHandle, MarkdownRenderer,
};
use studio_logging::{studio_error, studio_info, studio_warn};

use super::config::{Cli, Command, GalleryCommand};
use super::effects::EffectRunner;
use super::persistence;
use super::render::{describe_media, render_transcript, TerminalPrinter};

const EVENT_WAIT: Duration = Duration::from_millis(100);

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    fs::create_dir_all(&cli.data_dir)
        .with_context(|| format!("failed to create data dir {}", cli.data_dir.display()))?;
    if !studio_logging::initialize(cli.log.into(), cli.log_level, &cli.log_path()) {
        eprintln!("warning: logging is disabled");
    }
    studio_info!("Starting studio with data dir {}", cli.data_dir.display());

    let store = persistence::open_store(&cli.data_dir)?;
    let engine = EngineHandle::new(cli.engine_config()).context("failed to start engine")?;
    let renderer = select_renderer(!cli.plain_markdown);
    let mut app = App::new(EffectRunner::new(engine, store), cli.max_wait());

    let gallery = persistence::load_saved_gallery(app.runner.store());
    app.dispatch(Msg::RestoreGallery(gallery));

    match &cli.command {
        Command::Images { prompt } => {
            app.submit(Mode::Generate, Msg::PromptSubmitted(prompt.clone()))?
        }
        Command::Edit {
            image,
            mask,
            prompt,
        } => {
            let image = persistence::read_image(image)?;
            let mask = persistence::read_image(mask)?;
            app.submit(
                Mode::Edit,
                Msg::EditSubmitted {
                    image,
                    mask,
                    prompt: prompt.clone(),
                },
            )?;
        }
        Command::Video { prompt } => {
            app.submit(Mode::Video, Msg::VideoSubmitted(prompt.clone()))?
        }
        Command::Inspire { prompt } => {
            app.submit(Mode::Inspiration, Msg::PromptSubmitted(prompt.clone()))?
        }
        Command::Review { language, file } => {
            let Some(language) = find_language(language) else {
                bail!("unsupported language '{language}'");
            };
            let code = fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            if code.trim().is_empty() {
                bail!("{} is empty", file.display());
            }
            app.submit(
                Mode::Review,
                Msg::ReviewSubmitted {
                    code,
                    language: language.value.to_string(),
                },
            )?;
        }
        Command::Chat => app.chat(io::stdin().lock())?,
        Command::Gallery { command } => app.gallery(command)?,
    }

    if cli.save {
        app.save_produced_media();
    }
    if let Some(path) = &cli.html {
        write_transcript(path, &app.state.view(), renderer.as_ref())?;
    }
    app.dispatch(Msg::ViewClosed);
    app.printer.finish();

    match app.state.error() {
        Some(error) => bail!("{error}"),
        None => Ok(()),
    }
}

/// Single owner of the core state; runs the update loop against the engine.
struct App {
    state: AppState,
    runner: EffectRunner,
    printer: TerminalPrinter,
    max_wait: Option<Duration>,
}

impl App {
    fn new(runner: EffectRunner, max_wait: Option<Duration>) -> Self {
        Self {
            state: AppState::new(),
            runner,
            printer: TerminalPrinter::new(),
            max_wait,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.run(effects);
        if self.state.consume_dirty() {
            self.printer.render(&self.state.view());
        }
    }

    fn submit(&mut self, mode: Mode, msg: Msg) -> anyhow::Result<()> {
        if self.state.mode() != mode {
            self.dispatch(Msg::ModeSelected(mode));
        }
        self.dispatch(msg);
        self.wait_until_idle()
    }

    /// Feeds engine results to the core until no request is in flight.
    fn wait_until_idle(&mut self) -> anyhow::Result<()> {
        let started = Instant::now();
        while self.state.is_loading() {
            if self.max_wait.is_some_and(|limit| started.elapsed() >= limit) {
                studio_warn!("Giving up after {:?}", started.elapsed());
                self.dispatch(Msg::ViewClosed);
                break;
            }
            match self.runner.next_msg(EVENT_WAIT) {
                Ok(Some(msg)) => self.dispatch(msg),
                Ok(None) => {}
                Err(err) => {
                    studio_error!("Abandoning request: {}", err);
                    self.dispatch(Msg::ViewClosed);
                    self.printer.finish();
                    return Err(err).context("request did not complete");
                }
            }
        }
        self.printer.finish();
        Ok(())
    }

    fn chat(&mut self, input: impl BufRead) -> anyhow::Result<()> {
        self.dispatch(Msg::ModeSelected(Mode::Chat));
        for line in input.lines() {
            let line = line.context("failed to read input")?;
            if line.trim().is_empty() {
                continue;
            }
            if self.state.error().is_some() {
                self.dispatch(Msg::DismissError);
            }
            self.dispatch(Msg::PromptSubmitted(line));
            self.wait_until_idle()?;
        }
        Ok(())
    }

    fn gallery(&mut self, command: &GalleryCommand) -> anyhow::Result<()> {
        self.dispatch(Msg::ModeSelected(Mode::Gallery));
        let view = self.state.view();
        match command {
            GalleryCommand::List => {
                if view.gallery.is_empty() {
                    println!("The gallery is empty.");
                }
                for item in &view.gallery {
                    println!("{:>3}  {}", item.index + 1, describe_media(&item.data_uri));
                }
            }
            GalleryCommand::Remove { position } => {
                let Some(item) = position
                    .checked_sub(1)
                    .and_then(|index| view.gallery.get(index))
                else {
                    bail!("no gallery item at position {position}");
                };
                self.dispatch(Msg::RemoveFromGallery(item.data_uri.clone()));
                println!("Removed item {position}.");
            }
            GalleryCommand::Export { dir } => {
                let summary = export_gallery(self.state.gallery(), dir)
                    .with_context(|| format!("failed to export to {}", dir.display()))?;
                println!(
                    "Exported {} items to {}.",
                    summary.written.len(),
                    dir.display()
                );
                for position in summary.skipped {
                    println!("Skipped item {position}: not a readable media reference.");
                }
            }
        }
        Ok(())
    }

    fn save_produced_media(&mut self) {
        let unsaved: Vec<String> = self
            .state
            .view()
            .messages
            .into_iter()
            .flat_map(|message| message.attachments)
            .filter(|attachment| !attachment.saved)
            .map(|attachment| attachment.data_uri)
            .collect();
        for data_uri in unsaved {
            self.dispatch(Msg::SaveToGallery(data_uri));
        }
    }
}

fn write_transcript(
    path: &Path,
    view: &studio_core::AppViewModel,
    renderer: &dyn MarkdownRenderer,
) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("invalid transcript path {}", path.display()))?;
    let written = AtomicFileWriter::new(dir)
        .write(filename, render_transcript(view, renderer))
        .with_context(|| format!("failed to write transcript {}", path.display()))?;
    studio_info!("Transcript written to {}", written.display());
    Ok(())
}
