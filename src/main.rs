use clap::Parser;
use color_eyre::Result;
use orderdash::{App, AppConfig, AppEvent, ConfigManager, OpenOptions, Theme, APP_NAME};
use orderdash_cli::Args;
use ratatui::DefaultTerminal;
use std::sync::mpsc::channel;

fn open_options(args: &Args) -> OpenOptions {
    let mut opts = OpenOptions::new();
    if let Some(delimiter) = args.delimiter {
        opts = opts.with_delimiter(delimiter);
    }
    opts
}

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, args: &Args, config: AppConfig) -> Result<()> {
    let poll_interval = std::time::Duration::from_millis(config.performance.event_poll_interval_ms);
    let config_delimiter = config.file_loading.delimiter;
    let theme = Theme::from_config(&config.theme)?;

    let (tx, rx) = channel::<AppEvent>();
    let mut app = App::new_with_config(tx.clone(), theme, config);
    if let Some(mode) = &args.mode {
        match mode.as_str() {
            "driver" => app.set_mode(orderdash::drill::AggregateMode::Driver),
            "route" => app.set_mode(orderdash::drill::AggregateMode::Route),
            other => return Err(color_eyre::eyre::eyre!("Unknown mode '{}'", other)),
        }
    }
    if let Some(key) = &args.key {
        app.set_lookup_key(Some(key.clone()));
    }

    render(&mut terminal, &mut app)?;
    if let Some(path) = &args.path {
        let mut opts = open_options(args);
        if opts.delimiter.is_none() {
            opts.delimiter = config_delimiter;
        }
        tx.send(AppEvent::Open(path.clone(), opts))?;
    }

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(_, _) => tx.send(AppEvent::Resize)?,
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(std::time::Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    color_eyre::install()?;

    let config_manager = ConfigManager::new(APP_NAME)?;

    if args.init_config {
        let path = config_manager.write_default_config(args.force)?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let config = config_manager.load()?;

    let terminal = ratatui::init();
    let result = run(terminal, &args, config);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
