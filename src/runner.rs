// runner.rs
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::args::Args;
use crate::common::SolverStatus;
use crate::config::Settings;
use crate::lorenz::delayed_lorenz;
use crate::output::write_trajectory;
use crate::rk4::Rk4Solver;

pub struct Runner {
    args: Args,
    settings: Settings,
}

impl Runner {
    pub fn new(args: Args) -> Result<Runner> {
        Self::setup_logger(&args);
        let settings = Self::load_settings(&args.settings)?;
        Ok(Self { args, settings })
    }

    pub fn start(&self) -> Result<()> {
        let model = &self.settings.model;
        let integration = &self.settings.integration;

        let mut solver = Rk4Solver::new(
            delayed_lorenz(model.sigma, model.rho, model.beta),
            model.initial_state.clone(),
            model.delays.clone(),
            integration.dt,
            integration.total_time,
        )?;

        println!("Integrating {} points...", solver.num_points);
        log::info!(
            "Integrating {} points with dt = {} up to t = {}.",
            solver.num_points,
            integration.dt,
            integration.total_time
        );
        log::info!(
            "Number of data points for interpolation: {}",
            solver.history.len()
        );

        let bar = match self.args.disable_progress_bar {
            true => None,
            false => {
                let bar = ProgressBar::new((solver.num_points - 1) as u64);
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template(
                            "[{bar:40}] {pos:>7}/{len:7} [{elapsed_precise} / {duration_precise}] {msg}",
                        )
                        .expect("Unable to create template.")
                        .progress_chars("=> "),
                );
                Some(bar)
            }
        };

        let mut t_values = vec![solver.t];
        let mut y_values = vec![solver.y.clone()];

        while solver.status == SolverStatus::Running {
            let recorded = solver.step_index;
            solver.step()?;

            if solver.step_index > recorded {
                t_values.push(solver.t);
                y_values.push(solver.y.clone());

                if solver.step_index % 100 == 0 {
                    log::debug!(
                        "step={} t={} state={:?}",
                        solver.step_index,
                        solver.t,
                        solver.y
                    );
                }
                if let Some(bar) = bar.as_ref() {
                    bar.set_position(solver.step_index as u64);
                }
            }
        }

        if let Some(bar) = bar {
            bar.finish_with_message("Done.");
        }

        match solver.status {
            SolverStatus::HaltedOverflow => {
                let halted_step = solver.halted_step.unwrap_or(solver.step_index + 1);
                log::warn!("Overflow or invalid value detected at step {}", halted_step);
                println!("Overflow or invalid value detected at step {}", halted_step);
            }
            _ => log::info!("Finished integration."),
        }

        write_trajectory(&self.args.output, &t_values, &y_values)?;
        println!("Trajectory written to {}.", self.args.output);
        log::info!(
            "Wrote {} samples to {}.",
            t_values.len(),
            self.args.output
        );

        Ok(())
    }

    /// Setup logging level and file
    fn setup_logger(args: &Args) {
        let log_level = match args.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        simple_logging::log_to_file(args.log_file.as_str(), log_level).unwrap_or_else(|_| {
            eprintln!("Unable to open log file.");
            std::process::exit(1);
        });
    }

    /// Load settings from file
    fn load_settings(path: &str) -> Result<Settings> {
        let settings: Settings = Settings::read_from_file(path)?;
        log::info!("Loaded settings\n{}", settings);
        Ok(settings)
    }
}
