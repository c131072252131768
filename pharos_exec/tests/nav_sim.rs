//! Navigator, arbiter and simulated robot running together.

use std::sync::Arc;
use std::time::Duration;

use motion_if::{MotionCmd, MotionTask, Priority};
use pharos_lib::{
    arbiter::{ArbiterParams, MotionArbiter},
    mission::{run_mission, MissionParams, Waypoint},
    navigate::{NavOutcome, NavParams, NavState, Navigator},
    sensors::{CompassBufferParams, CompassDataBuffer, GpsBufferParams, GpsDataBuffer},
    sim::{SimParams, SimRobot},
};
use util::{logger::LogContext, sched::Periodic};

struct Rig {
    robot: SimRobot,
    sim: Periodic,
    arbiter: MotionArbiter,
    nav: Arc<Navigator>,
}

fn rig() -> Rig {
    let log = LogContext::new("nav_sim");

    let gps = Arc::new(GpsDataBuffer::new(GpsBufferParams::default(), log.child("gps")));
    let compass = Arc::new(CompassDataBuffer::new(
        CompassBufferParams::default(),
        log.child("compass"),
    ));

    let sim_params = SimParams {
        step_period_ms: 10,
        gps_period_ms: 50,
        compass_period_ms: 20,
        ..Default::default()
    };
    let robot = SimRobot::new(sim_params, gps.clone(), compass.clone(), log.child("sim"));

    let arbiter = MotionArbiter::new(
        ArbiterParams {
            cycle_period_ms: 20,
            ..Default::default()
        },
        Box::new(robot.drive()),
        log.child("arbiter"),
    );
    arbiter.submit_task(MotionTask::stop(Priority::Third));

    let nav = Navigator::new(
        NavParams {
            cycle_period_ms: 40,
            ..Default::default()
        },
        arbiter.clone(),
        gps,
        compass,
        log.child("nav"),
    );

    let sim = robot.spawn(Duration::from_millis(10)).unwrap();
    arbiter.start().unwrap();

    // Let the first fixes arrive
    std::thread::sleep(Duration::from_millis(100));

    Rig {
        robot,
        sim,
        arbiter,
        nav: Arc::new(nav),
    }
}

#[test]
fn test_drives_to_waypoint() {
    let rig = rig();
    let dest = rig.robot.location().offset_by(8.0, -3.0);

    assert!(rig.nav.go(dest, 2.0));
    assert_eq!(rig.nav.state(), NavState::Arrived);
    assert!(rig.robot.location().distance_to(&dest) < 2.0);

    // Stopped once arrived
    std::thread::sleep(Duration::from_millis(60));
    assert_eq!(rig.arbiter.last_cmd(), Some(MotionCmd::STOP));
    let parked = rig.robot.location();
    std::thread::sleep(Duration::from_millis(100));
    assert!(parked.distance_to(&rig.robot.location()) < 1e-6);

    rig.arbiter.shutdown();
    rig.sim.stop();
}

#[test]
fn test_stop_from_another_thread() {
    let rig = rig();
    let dest = rig.robot.location().offset_by(200.0, 0.0);

    let runner = {
        let nav = rig.nav.clone();
        std::thread::spawn(move || nav.navigate(dest, 1.0))
    };

    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(rig.nav.state(), NavState::Approaching);
    assert!(rig.arbiter.last_cmd().unwrap().speed_ms > 0.0);
    assert!(!rig.nav.are_we_there_yet(Duration::from_secs(1)));
    assert!(rig.nav.are_we_there_yet(Duration::from_secs(1000)));

    rig.nav.stop();
    assert_eq!(runner.join().unwrap(), NavOutcome::Cancelled);

    std::thread::sleep(Duration::from_millis(60));
    assert_eq!(rig.arbiter.last_cmd(), Some(MotionCmd::STOP));

    rig.arbiter.shutdown();
    rig.sim.stop();
}

#[test]
fn test_mission_skips_implausible_waypoint() {
    let rig = rig();
    let start = rig.robot.location();

    let mission = MissionParams {
        cruise_speed_ms: 2.0,
        waypoints: vec![
            Waypoint {
                name: "far away".into(),
                location: start.offset_by(5000.0, 0.0),
                speed_ms: None,
                pause_ms: 0,
            },
            Waypoint {
                name: "close".into(),
                location: start.offset_by(4.0, 0.0),
                speed_ms: Some(1.0),
                pause_ms: 0,
            },
        ],
    };

    let report = run_mission(&mission, &rig.nav, &LogContext::new("nav_sim::mission"));

    assert_eq!(report.total, 2);
    assert_eq!(report.reached, 1);
    assert!(matches!(report.waypoints[0].outcome, NavOutcome::Aborted(d) if d > 2000.0));
    assert_eq!(report.waypoints[1].outcome, NavOutcome::Arrived);

    rig.arbiter.shutdown();
    rig.sim.stop();
}
