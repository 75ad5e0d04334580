//! Virtual shades — a writable percentage that takes time to reach.
//!
//! A drive call returns busy and a background task reports the new
//! position after the travel time. A newer drive call cancels the pending
//! one.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use homerc_app::ResourceSpec;
use homerc_app::ports::{DriveOutcome, DriveTarget};
use homerc_domain::value::{Value, ValueType};

/// Simulated motorised shades; 0 % is open, 100 % closed.
#[derive(Debug)]
pub struct VirtualShades {
    position: Arc<Mutex<f64>>,
    travel: Duration,
    moving: Mutex<Option<JoinHandle<()>>>,
}

impl VirtualShades {
    pub const LID: &'static str = "shades";

    #[must_use]
    pub fn new(travel: Duration) -> Self {
        Self {
            position: Arc::new(Mutex::new(0.0)),
            travel,
            moving: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn spec() -> ResourceSpec {
        ResourceSpec::writable(ValueType::Percent)
    }

    #[must_use]
    pub fn position(&self) -> f64 {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start moving to `value`. Without a tokio runtime the move is instant.
    pub fn drive(&self, target: &DriveTarget<'_>, value: &Value) -> DriveOutcome {
        let Value::Float(goal) = value else {
            return DriveOutcome::Failed;
        };
        let goal = goal.clamp(0.0, 100.0);
        let Ok(runtime) = Handle::try_current() else {
            *self.position.lock().unwrap_or_else(PoisonError::into_inner) = goal;
            return DriveOutcome::Reported(Value::Float(goal));
        };

        let position = Arc::clone(&self.position);
        let reporter = target.reporter.clone();
        let travel = self.travel;
        let task = runtime.spawn(async move {
            tokio::time::sleep(travel).await;
            *position.lock().unwrap_or_else(PoisonError::into_inner) = goal;
            debug!(goal, "virtual shades arrived");
            if let Err(err) = reporter.report_value(goal) {
                warn!(error = %err, "failed to report shades position");
            }
        });
        let previous = self
            .moving
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
        DriveOutcome::Busy
    }

    /// Cancel a pending move.
    pub fn stop(&self) {
        if let Some(task) = self
            .moving
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use homerc_app::ports::Driver;
    use homerc_app::{Arbitration, Directory, DirectoryConfig, WaitOutcome};
    use homerc_domain::request::Request;
    use homerc_domain::uri::ResourceUri;

    use super::*;

    struct ShadesDriver(Arc<VirtualShades>);

    impl Driver for ShadesDriver {
        fn drive(&self, target: &DriveTarget<'_>, value: &Value) -> DriveOutcome {
            self.0.drive(target, value)
        }

        fn stop(&self) {
            self.0.stop();
        }
    }

    fn setup(travel: Duration) -> (Directory, Arc<VirtualShades>, ResourceUri) {
        let directory = Directory::init(DirectoryConfig::default()).unwrap();
        let shades = Arc::new(VirtualShades::new(travel));
        directory
            .register_driver("virtual", Arc::new(ShadesDriver(Arc::clone(&shades))))
            .unwrap();
        directory
            .register_resource("local", "virtual", VirtualShades::LID, VirtualShades::spec())
            .unwrap();
        let uri = ResourceUri::new("local", "virtual", VirtualShades::LID).unwrap();
        (directory, shades, uri)
    }

    fn request(position: impl Into<Value>) -> Request {
        Request::builder("g", position).build().unwrap()
    }

    #[test]
    fn should_move_instantly_without_runtime() {
        let (directory, shades, uri) = setup(Duration::from_secs(60));
        let outcome = directory.set_request(&uri, request(35.0)).unwrap();
        assert_eq!(
            outcome,
            Arbitration::Driven(DriveOutcome::Reported(Value::Float(35.0)))
        );
        assert!((shades.position() - 35.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_clamp_position_to_percent_range() {
        let (directory, shades, uri) = setup(Duration::from_secs(60));
        directory.set_request(&uri, request(150.0)).unwrap();
        assert!((shades.position() - 100.0).abs() < f64::EPSILON);
        assert_eq!(directory.get_value(&uri).unwrap(), Some(Value::Float(100.0)));
    }

    #[test]
    fn should_fail_for_non_float_value() {
        let (directory, shades, uri) = setup(Duration::from_secs(60));
        let id = directory.resolve(&uri).unwrap();
        let reporter = directory.reporter(id);
        let target = DriveTarget {
            id,
            uri: &uri,
            value_type: ValueType::Percent,
            reporter: &reporter,
        };
        assert_eq!(shades.drive(&target, &Value::Bool(true)), DriveOutcome::Failed);
        assert!(shades.position().abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn should_report_only_latest_position_when_move_is_replaced() {
        let (directory, shades, uri) = setup(Duration::from_millis(30));
        let subscriber = directory.subscribe("watcher").unwrap();
        subscriber.add_pattern("local/virtual/shades").unwrap();

        let first = directory.set_request(&uri, request(30.0)).unwrap();
        let second = directory.set_request(&uri, request(70.0)).unwrap();
        assert_eq!(first, Arbitration::Driven(DriveOutcome::Busy));
        assert_eq!(second, Arbitration::Driven(DriveOutcome::Busy));

        let mut reported = Vec::new();
        while let WaitOutcome::Event(event) =
            subscriber.wait_event(Some(Duration::from_millis(200))).await
        {
            if let Some(value) = event.new.valid_value() {
                reported.push(value.clone());
            }
        }
        assert_eq!(reported, vec![Value::Float(70.0)]);
        assert!((shades.position() - 70.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn should_cancel_pending_move_on_stop() {
        let (directory, shades, uri) = setup(Duration::from_millis(20));
        directory.set_request(&uri, request(80.0)).unwrap();
        shades.stop();

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(shades.position().abs() < f64::EPSILON);
        assert!(directory.get_value_state(&uri).unwrap().is_busy());
    }
}
