//! Constants used throughout the application

/// Number of landmarks produced by the face mesh model
pub const NUM_FACE_MESH_LANDMARKS: usize = 468;

/// Values per face mesh landmark (x, y, z)
pub const FACE_MESH_VALUES_PER_LANDMARK: usize = 3;

/// Square input size of the face mesh model in pixels
pub const FACE_MESH_INPUT_SIZE: i32 = 192;

/// Nose tip, drives the cursor
pub const NOSE_TIP: usize = 1;

/// Left eye upper lid
pub const LEFT_EYE_UPPER: usize = 159;
/// Left eye lower lid
pub const LEFT_EYE_LOWER: usize = 145;

/// Right eye upper lid
pub const RIGHT_EYE_UPPER: usize = 386;
/// Right eye lower lid
pub const RIGHT_EYE_LOWER: usize = 374;

/// Lid distance (normalized) below which an eye counts as closed.
/// Hand-tuned; adjust per camera and face.
pub const DEFAULT_BLINK_THRESHOLD: f64 = 0.004;

/// Frames an eye stays disarmed after a registered blink
pub const DEFAULT_BLINK_COOLDOWN_FRAMES: u32 = 10;

/// Key code that stops the tracking loop (ESC)
pub const EXIT_KEY: i32 = 27;

/// Preview window title
pub const PREVIEW_WINDOW: &str = "Nose + Blink Mouse";

/// Image normalization constants for face detection
pub const IMAGE_NORMALIZATION_OFFSET: f32 = 127.5;
pub const IMAGE_NORMALIZATION_SCALE: f32 = 128.0;

/// Default face detector thresholds
pub const DEFAULT_DETECTION_CONFIDENCE: f32 = 0.5;
pub const DEFAULT_NMS_THRESHOLD: f32 = 0.4;

/// Fraction of the face box added on each side before cropping for the mesh model
pub const DEFAULT_CROP_EXPANSION: f32 = 0.25;

/// Minimum face presence score reported by the mesh model
pub const DEFAULT_PRESENCE_THRESHOLD: f32 = 0.5;

/// Largest number of tickets in one booking
pub const MAX_TICKETS: u32 = 10;

/// Screen assumed by the dry-run pointer sink
pub const DRY_RUN_SCREEN_WIDTH: u16 = 1920;
pub const DRY_RUN_SCREEN_HEIGHT: u16 = 1080;
