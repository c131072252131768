//! Main pharos executable entry point.
//!
//! # Architecture
//!
//! The executable runs a mission on the simulated robot:
//!
//!     - Initialise the session, logging and parameters
//!     - Build the sensor buffers and the simulated robot publishing into them
//!     - Build the motion arbiter in front of the simulated drive, with an idle stop task at the
//!       lowest priority
//!     - Navigate to each waypoint of the mission in turn
//!     - Save the mission report and shut everything down

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::sync::Arc;

use color_eyre::{eyre::WrapErr, Report};
use log::info;
use structopt::StructOpt;

// Internal
use motion_if::{MotionTask, Priority};
use pharos_lib::{
    arbiter::{ArbiterParams, MotionArbiter},
    mission::{run_mission, MissionParams},
    navigate::{NavParams, Navigator},
    params::load_validated,
    sensors::{CompassDataBuffer, GpsDataBuffer, SensorsParams},
    sim::{SimParams, SimRobot},
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter, LogContext},
    session::Session,
    time::millis,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "pharos_exec", about = "Runs a GPS waypoint mission on the simulated robot")]
struct Opts {
    /// Mission file, relative to the params directory
    #[structopt(long, default_value = "mission.toml")]
    mission: String,

    /// Minimum level of log messages (trace, debug or info)
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("pharos_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opts.log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Pharos Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    let log = LogContext::default();

    // ---- LOAD PARAMETERS ----

    let arb_params: ArbiterParams =
        load_validated("arbiter.toml").wrap_err("Could not load arbiter params")?;
    let nav_params: NavParams = load_validated("nav.toml").wrap_err("Could not load nav params")?;
    let sensors_params: SensorsParams =
        load_validated("sensors.toml").wrap_err("Could not load sensor params")?;
    let sim_params: SimParams = load_validated("sim.toml").wrap_err("Could not load sim params")?;
    let mission: MissionParams = load_validated(&opts.mission)
        .wrap_err_with(|| format!("Could not load the mission \"{}\"", opts.mission))?;

    info!("Parameters loaded");

    // ---- INITIALISE MODULES ----

    let gps = Arc::new(GpsDataBuffer::new(sensors_params.gps, log.child("gps")));
    let compass = Arc::new(CompassDataBuffer::new(
        sensors_params.compass,
        log.child("compass"),
    ));

    let sim_period = millis(sim_params.step_period_ms);
    let robot = SimRobot::new(sim_params, gps.clone(), compass.clone(), log.child("sim"));

    let arbiter = MotionArbiter::new(arb_params, Box::new(robot.drive()), log.child("arbiter"));
    arbiter.submit_task(MotionTask::stop(Priority::Third));

    let navigator = Navigator::new(nav_params, arbiter.clone(), gps, compass, log.child("nav"))
        .with_archive(
            Archiver::from_path(&session, "nav.csv")
                .wrap_err("Could not create the navigation archive")?,
        );

    info!("Module initialisation complete\n");

    // ---- RUN ----

    let sim = robot
        .spawn(sim_period)
        .wrap_err("Could not start the simulation")?;
    arbiter.start().wrap_err("Could not start the arbiter")?;

    let report = run_mission(&mission, &navigator, &log.child("mission"));

    // ---- SHUTDOWN ----

    arbiter.shutdown();
    sim.stop();

    let report_path = session
        .save("mission_report.json", &report)
        .wrap_err("Could not save the mission report")?;

    info!(
        "Reached {} of {} waypoints, final position {}",
        report.reached,
        report.total,
        robot.location()
    );
    info!("Mission report saved to {:?}", report_path);
    info!("End of execution");

    Ok(())
}
