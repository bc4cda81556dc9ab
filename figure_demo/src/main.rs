//! User acceptance walkthrough
//!
//! Runs through the display scenarios one after another and prints what
//! should be on screen. Windows must be closed (the `q` key works) for the
//! walkthrough to continue. The backend comes from `FIGURE_GUI_BACKEND`, and
//! `FIGURE_GUI_CONFIG` may point at a `.toml` or `.ron` configuration file.

use figure_gui::core::{Config, ConfigError};
use figure_gui::foundation::logging;
use figure_gui::{
    subplot_mosaic, subplots, Figure, FigureContext, FigureRegistry, GuiConfig, GuiContext,
    GuiError, RegistryOptions,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const CONFIG_ENV_VAR: &str = "FIGURE_GUI_CONFIG";

#[derive(Error, Debug)]
enum DemoError {
    #[error("GUI error: {0}")]
    Gui(#[from] GuiError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

fn load_config() -> Result<GuiConfig, DemoError> {
    let config = match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) => GuiConfig::load_from_file(path)?,
        None => GuiConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn prompt(text: &str) {
    println!("\n{}\n", text.trim());
}

fn main() -> Result<(), DemoError> {
    let config = load_config()?;
    logging::init_with_level(&config.log_level);

    let context = GuiContext::new(config)?;
    let backend = context.current_backend()?;
    log::info!("Running the walkthrough on backend {} {}", backend.name(), backend.version());

    two_windows(&context)?;
    interactive_show(&context)?;
    explicit_blocking(&context)?;
    creation_helpers(&context)?;
    registry(&context)?;
    scoped_registry(&context)?;

    log::info!("Walkthrough finished");
    Ok(())
}

fn two_windows(context: &Arc<GuiContext>) -> Result<(), DemoError> {
    let fig1 = Figure::new(context.figure_options().with_label("A Label!"));
    let fig2 = Figure::new(context.figure_options());
    prompt(
        r#"
You should see two figures with window titles of

 - "A Label!"
 - "Figure 1"

both should be empty and the process should block until both
are closed (the keybinding 'q' should work)."#,
    );
    context.show(&[fig1, fig2], None, Duration::ZERO)?;
    Ok(())
}

fn interactive_show(context: &Arc<GuiContext>) -> Result<(), DemoError> {
    let fig = Figure::new(context.figure_options());
    {
        let _interactive = context.ion();
        println!("Interactive mode is on: {}", context.is_interactive());
        context.show(&[fig.clone()], None, Duration::ZERO)?;
        println!("An (implicitly) non-blocking show was just called.");
    }
    println!("Interactive mode is on: {}", context.is_interactive());
    prompt(
        r"
You should see one open figure with the title

- Figure 2

and the process should again block until it is closed.",
    );
    context.show(&[fig], None, Duration::ZERO)?;
    Ok(())
}

fn explicit_blocking(context: &Arc<GuiContext>) -> Result<(), DemoError> {
    let fig = Figure::new(context.figure_options().with_label("control blocking"));
    context.show(&[fig.clone()], Some(false), Duration::ZERO)?;
    println!("An (explicitly) non-blocking show was just called.");
    prompt(
        r"
You should see one open figure with the title

- control blocking

and the process should again block until it is closed.",
    );
    context.show(&[fig], Some(true), Duration::ZERO)?;
    Ok(())
}

fn creation_helpers(context: &Arc<GuiContext>) -> Result<(), DemoError> {
    let fig1 = Figure::new(context.figure_options());
    let (fig2, axes) = subplots(2, 2, context.figure_options())?;
    for (ax, slope) in axes.iter().zip(1..) {
        ax.plot((0..10).map(|x| f64::from(x * slope)));
    }
    let (fig3, mosaic) = subplot_mosaic("AA\nBC", context.figure_options())?;
    mosaic[&'A'].plot([1.0, 3.0, 2.0, 4.0]);
    prompt(
        r"
You should see three open figures with the titles

- Figure 4
- Figure 5
- Figure 6

and the process should again block until they are closed. One will
be empty, one will have a 2x2 grid, one will have an `AA;BC` layout.",
    );
    context.show(&[fig1, fig2, fig3], None, Duration::ZERO)?;
    Ok(())
}

fn registry(context: &Arc<GuiContext>) -> Result<(), DemoError> {
    let registry = FigureRegistry::with_context(Arc::clone(context), RegistryOptions::from(&context.config().registry));
    registry.figure(registry.figure_options())?;
    registry.subplots(2, 2, registry.figure_options())?;
    registry.subplot_mosaic("AA\nBC", registry.figure_options())?;
    prompt(
        r"
You should see three open figures with the titles

- Figure 0
- Figure 1
- Figure 2

and the process should again block until they are closed. One will
be empty, one will have a 2x2 grid, one will have an `AA;BC` layout.",
    );
    registry.show_all(None, None)?;
    Ok(())
}

fn scoped_registry(context: &Arc<GuiContext>) -> Result<(), DemoError> {
    let options = RegistryOptions::from(&context.config().registry);
    FigureContext::with_context(Arc::clone(context), options).scope(|figures| {
        figures.subplot_mosaic("AA\nBC", figures.figure_options())?;
        figures.figure(figures.figure_options())?;
        figures.subplots(2, 2, figures.figure_options())?;
        prompt(
            r"
You should see three open figures with the titles

- Figure 0
- Figure 1
- Figure 2

and the process should again block until they are closed. One will
be empty, one will have a 2x2 grid, one will have an `AA;BC` layout.",
        );
        Ok::<_, DemoError>(())
    })
}
