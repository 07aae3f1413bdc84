//! End-to-end scenarios: a scene controller on the main thread, worker
//! threads using the registry, and the export pipeline.

use std::fs::File;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use slicer_control::config::Settings;
use slicer_control::controller::{JobError, JobPhase, SceneController};
use slicer_control::export::{ExportQuery, PngExportConfig};
use slicer_control::issue::IssueKind;
use slicer_control::models::{LayerImage, Print, PrintObject, PrintResult};
use slicer_control::progress::{
    CallbackIndicator, IndicatorFactory, IndicatorHandle, ProgressIndicator,
};
use tempfile::tempdir;

struct FixtureObject {
    name: &'static str,
}

impl PrintObject for FixtureObject {
    fn name(&self) -> String {
        self.name.to_string()
    }
}

struct FixturePrint {
    objects: Vec<Arc<dyn PrintObject>>,
    ops: Mutex<Vec<String>>,
    layers: usize,
}

impl FixturePrint {
    fn new(object_names: &[&'static str], layers: usize) -> Self {
        Self {
            objects: object_names
                .iter()
                .map(|&name| Arc::new(FixtureObject { name }) as Arc<dyn PrintObject>)
                .collect(),
            ops: Mutex::new(Vec::new()),
            layers,
        }
    }

    fn record(&self, op: String) {
        self.ops.lock().push(op);
    }

    fn ops(&self) -> Vec<String> {
        self.ops.lock().clone()
    }
}

impl Print for FixturePrint {
    fn name(&self) -> String {
        "fixture".to_string()
    }

    fn objects(&self) -> Vec<Arc<dyn PrintObject>> {
        self.objects.clone()
    }

    fn make_skirt(&self) -> PrintResult<()> {
        self.record("skirt".to_string());
        Ok(())
    }

    fn make_brim(&self) -> PrintResult<()> {
        self.record("brim".to_string());
        Ok(())
    }

    fn make_wipe_tower(&self) -> PrintResult<()> {
        self.record("wipe_tower".to_string());
        Ok(())
    }

    fn make_perimeters(&self, object: &dyn PrintObject) -> PrintResult<()> {
        self.record(format!("perimeters:{}", object.name()));
        Ok(())
    }

    fn infill(&self, object: &dyn PrintObject) -> PrintResult<()> {
        self.record(format!("infill:{}", object.name()));
        Ok(())
    }

    fn generate_support_material(&self, object: &dyn PrintObject) -> PrintResult<()> {
        self.record(format!("support:{}", object.name()));
        Ok(())
    }

    fn layer_count(&self) -> usize {
        self.layers
    }

    fn rasterize_layer(&self, index: usize, config: &PngExportConfig) -> PrintResult<LayerImage> {
        Ok(LayerImage::new(
            index,
            config.width_px,
            config.height_px,
            format!("layer {}", index).into_bytes(),
        ))
    }
}

fn scene_with_log_dir() -> (SceneController, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let mut settings = Settings::default();
    settings.paths.logs_folder = dir.path().join("logs").to_string_lossy().into_owned();
    let scene = SceneController::builder().settings(settings).build();
    (scene, dir)
}

#[test]
fn workers_get_their_own_indicators_main_thread_stays_unbound() {
    let (scene, _dir) = scene_with_log_dir();
    let registry = Arc::clone(scene.registry());

    let mut workers = Vec::new();
    for i in 0..3 {
        let registry = Arc::clone(&registry);
        workers.push(thread::spawn(move || {
            let handle = registry.get_or_create(10, &format!("stage {}", i), "Starting");
            let title = handle.title();
            registry.remove();
            title
        }));
    }

    let mut titles: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    titles.sort();
    assert_eq!(titles, vec!["stage 0", "stage 1", "stage 2"]);

    // Nothing was ever bound for the main thread.
    assert!(registry.get().is_none());
    // Workers removed their bindings on exit.
    assert!(registry.is_empty());
}

#[test]
fn fatal_reported_before_slicing_prevents_every_stage() {
    let (scene, _dir) = scene_with_log_dir();
    let print = Arc::new(FixturePrint::new(&["a", "b"], 2));
    let job = scene.set_print(print.clone()).unwrap();

    job.reporter()
        .report(IssueKind::Fatal, "mesh failed validation", "Fatal");

    let err = job.slice().err().unwrap();
    assert!(matches!(err, JobError::Fatal { .. }));
    assert_eq!(job.phase(), JobPhase::Failed);
    assert!(print.ops().is_empty());
}

#[test]
fn concurrent_object_reslices_share_the_controller() {
    let (scene, _dir) = scene_with_log_dir();
    let print = Arc::new(FixturePrint::new(&["a", "b"], 2));
    let job = scene.set_print(print.clone()).unwrap();

    let mut workers = Vec::new();
    for index in 0..2 {
        let job = Arc::clone(&job);
        workers.push(thread::spawn(move || job.slice_object(index)));
    }
    for worker in workers {
        worker.join().unwrap().unwrap();
    }

    let ops = print.ops();
    for object in ["a", "b"] {
        for stage in ["perimeters", "infill", "support"] {
            let op = format!("{}:{}", stage, object);
            assert_eq!(ops.iter().filter(|&o| *o == op).count(), 1, "{}", op);
        }
    }
}

/// Factory that counts updates per indicator title.
struct CountingFactory {
    updates: Arc<Mutex<Vec<(String, u32)>>>,
}

impl IndicatorFactory for CountingFactory {
    fn create(&self, state_count: u32, title: &str, _first_message: &str) -> IndicatorHandle {
        let updates = Arc::clone(&self.updates);
        let title_owned = title.to_string();
        Arc::new(CallbackIndicator::new(
            state_count,
            title,
            Box::new(move |state, _range, _msg| {
                updates.lock().push((title_owned.clone(), state));
            }),
        ))
    }
}

/// Export query standing in for the front-end dialog: keeps the
/// pre-populated values and picks a destination.
struct DialogStandIn {
    zip_path: std::path::PathBuf,
    seen_prev: Arc<Mutex<Option<PngExportConfig>>>,
}

impl ExportQuery for DialogStandIn {
    fn query_png_export(&self, prev: &PngExportConfig) -> Option<PngExportConfig> {
        *self.seen_prev.lock() = Some(prev.clone());
        Some(prev.clone().with_zip_path(&self.zip_path))
    }
}

#[test]
fn png_export_updates_once_per_layer_and_archives_each() {
    let out_dir = tempdir().unwrap();
    let zip_path = out_dir.path().join("layers.zip");
    let updates = Arc::new(Mutex::new(Vec::new()));
    let seen_prev = Arc::new(Mutex::new(None));

    let mut settings = Settings::default();
    settings.paths.logs_folder = out_dir.path().join("logs").to_string_lossy().into_owned();

    let scene = SceneController::builder()
        .settings(settings)
        .indicator_factory(Arc::new(CountingFactory {
            updates: Arc::clone(&updates),
        }))
        .export_query(Arc::new(DialogStandIn {
            zip_path: zip_path.clone(),
            seen_prev: Arc::clone(&seen_prev),
        }))
        .build();

    let layers = 6;
    let print = Arc::new(FixturePrint::new(&["a"], layers));
    let job = scene.set_print(print).unwrap();

    let written = job.slice_to_png().unwrap();
    assert_eq!(written, zip_path);

    // The dialog was pre-populated with the configured defaults.
    let prev = seen_prev.lock().clone().unwrap();
    assert_eq!(prev.width_px, 1440);
    assert_eq!(prev.height_px, 2560);
    assert_eq!(prev.width_mm, 68.0);
    assert_eq!(prev.height_mm, 120.0);
    assert_eq!((prev.corr_x, prev.corr_y, prev.corr_z), (1.0, 1.0, 1.0));

    // One progress update per rendered layer.
    let export_updates: Vec<_> = updates
        .lock()
        .iter()
        .filter(|(title, _)| title == "Exporting layers")
        .map(|(_, state)| *state)
        .collect();
    assert_eq!(export_updates, (1..=layers as u32).collect::<Vec<_>>());

    // One archive entry per layer.
    let archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
    assert_eq!(archive.len(), layers);
}

#[test]
fn export_from_worker_thread_is_rejected() {
    let (scene, _dir) = scene_with_log_dir();
    let print = Arc::new(FixturePrint::new(&["a"], 2));
    let job = scene.set_print(print).unwrap();
    job.slice().unwrap();

    let result = thread::spawn(move || job.slice_to_png()).join().unwrap();
    assert!(matches!(result, Err(JobError::MainThreadRequired { .. })));
}
