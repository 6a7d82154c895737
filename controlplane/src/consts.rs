// API group of the MicroService custom resource.
pub const MICROSERVICE_GROUP: &str = "app.kubeservice.io";

// Field manager for the kubeservice controller.
pub const KUBESERVICE_FIELD_MANAGER: &str = "kubeservice-field-manager";

// Separator between the MicroService name and the version name in per-version Service names.
pub const VERSION_SERVICE_SEPARATOR: &str = "-";

// Default interval between periodic resyncs of a MicroService, in seconds.
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;

// Default delay before retrying a failed reconciliation, in seconds.
pub const DEFAULT_ERROR_REQUEUE_SECS: u64 = 5;

// Default debounce applied to MicroService reconciliations, in milliseconds.
pub const DEFAULT_DEBOUNCE_MILLIS: u64 = 500;
