/// Product variables file name inside the soong out dir, written by product config.
pub const PRODUCT_VARIABLES_FILENAME: &str = "soong.variables";

/// Marker file whose presence means Kati runs after configuration.
pub const KATI_ENABLED_MARKER: &str = ".soong.kati_enabled";

/// Directory (next to the product variables file) that receives generated Bazel files.
pub const INJECTION_DIR: &str = "soong_injection";

/// Subdirectory of [`INJECTION_DIR`] holding the exported product config.
pub const PRODUCT_CONFIG_DIR: &str = "product_config";

/// Header placed at the top of every generated Bazel file.
pub const GENERATED_BAZEL_FILE_WARNING: &str = "# GENERATED FOR BAZEL FROM SOONG. DO NOT EDIT.";

/// Default remote execution wrapper when `RBE_WRAPPER` is unset.
pub const DEFAULT_RBE_WRAPPER: &str = "prebuilts/remoteexecution-client/live/rewrapper";

/// Default batch size for Java cross-reference compilation units.
pub const XREF_JAVA_SOURCE_MAX_DEFAULT: &str = "1000";
