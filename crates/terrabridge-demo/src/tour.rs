//! A scripted camera tour that exercises transitions, gestures and free
//! flight.

use glam::{Vec2, Vec3};
use terrabridge::camera::{CameraGesture, CameraUpdate, FlyCamera, FlyInput, FlySettings};
use terrabridge::space::{LatLong, LatLongAltitude};
use terrabridge::{MapSession, Result, SceneBackend, StreamingEngine};

/// One place the tour visits.
#[derive(Debug, Clone, Copy)]
pub struct TourStop {
    pub name: &'static str,
    pub location: LatLong,
    pub distance: f64,
    pub heading_degrees: f64,
    pub pitch_degrees: f64,
}

/// San Francisco landmarks, then a hop far enough away to jump.
pub const STOPS: [TourStop; 4] = [
    TourStop {
        name: "Transamerica Pyramid",
        location: LatLong::new(37.795_157_2, -122.402_891_5),
        distance: 1500.0,
        heading_degrees: 90.0,
        pitch_degrees: 45.0,
    },
    TourStop {
        name: "Ferry Building",
        location: LatLong::new(37.795_5, -122.393_7),
        distance: 800.0,
        heading_degrees: 220.0,
        pitch_degrees: 30.0,
    },
    TourStop {
        name: "Golden Gate Park",
        location: LatLong::new(37.769_4, -122.486_2),
        distance: 2500.0,
        heading_degrees: 0.0,
        pitch_degrees: 60.0,
    },
    TourStop {
        name: "Tower Bridge",
        location: LatLong::new(51.505_5, -0.075_4),
        distance: 1200.0,
        heading_degrees: 300.0,
        pitch_degrees: 40.0,
    },
];

/// Drives a session through the tour.
pub struct Tour {
    pub frames_per_stop: u32,
    pub dt: f64,
}

impl Tour {
    /// Visit every stop, then fly and settle back onto an orbit.
    pub fn run<B: SceneBackend, E: StreamingEngine>(
        &self,
        session: &mut MapSession<B, E>,
        mut on_frame: impl FnMut(&MapSession<B, E>),
    ) -> Result<()> {
        session.bind_camera();

        for stop in &STOPS {
            tracing::info!(stop = stop.name, "heading to stop");
            session.animate_to(
                CameraUpdate::default()
                    .lat_long(stop.location)
                    .distance(stop.distance)
                    .heading(stop.heading_degrees)
                    .pitch(stop.pitch_degrees),
                None,
                true,
            )?;
            for frame in 0..self.frames_per_stop {
                // A user nudge half-way through.
                if frame == self.frames_per_stop / 2
                    && let Err(e) = session.apply_gesture(CameraGesture::Rotate { degrees: 15.0 })
                {
                    tracing::debug!(error = %e, "gesture refused");
                }
                self.frame(session, &mut on_frame)?;
            }
        }

        self.fly(session, &mut on_frame)?;

        // Settle onto the ground below the fly camera, viewed from where it is.
        let position = LatLongAltitude::from_ecef(session.camera_placement().position);
        let interest = LatLongAltitude::new(position.latitude + 0.005, position.longitude, 0.0);
        session.move_to(CameraUpdate::from_camera_position(interest, position))?;
        self.frame(session, &mut on_frame)
    }

    fn fly<B: SceneBackend, E: StreamingEngine>(
        &self,
        session: &mut MapSession<B, E>,
        on_frame: &mut impl FnMut(&MapSession<B, E>),
    ) -> Result<()> {
        tracing::info!("free flight");
        let mut camera = FlyCamera::from_placement(&session.camera_placement(), FlySettings::default());
        let input = FlyInput {
            movement: Vec3::new(0.0, 0.1, 1.0),
            look: Vec2::new(0.2, -0.05),
        };
        for _ in 0..self.frames_per_stop {
            camera.update(&input, self.dt, session.controller().is_transitioning());
            session.set_free_camera(camera.placement());
            self.frame(session, on_frame)?;
        }
        Ok(())
    }

    fn frame<B: SceneBackend, E: StreamingEngine>(
        &self,
        session: &mut MapSession<B, E>,
        on_frame: &mut impl FnMut(&MapSession<B, E>),
    ) -> Result<()> {
        session.update(self.dt)?;
        for event in session.take_camera_events() {
            tracing::debug!(?event, "camera event");
        }
        on_frame(session);
        Ok(())
    }
}
