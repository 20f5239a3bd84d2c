/// Helper macro to avoid retyping the base domain-like name of the workspace system when creating
/// further string constants from it. When given no parameters, this returns the base name. When
/// given a string literal parameter it adds `.parameter` to the end.
macro_rules! che {
    () => {
        "che"
    };
    ($s:literal) => {
        concat!(che!(), ".", $s)
    };
}

// Label keys
pub const CHE_ORIGINAL_NAME_LABEL: &str = che!("original_name");
pub const CHE_WORKSPACE_ID_LABEL: &str = che!("workspace_id");
pub const CHE_VOLUME_NAME_LABEL: &str = che!("workspace.volume_name");

// Machine attributes
pub const MEMORY_LIMIT_ATTRIBUTE: &str = "memoryLimitBytes";
pub const MEMORY_REQUEST_ATTRIBUTE: &str = "memoryRequestBytes";
pub const CPU_LIMIT_ATTRIBUTE: &str = "cpuLimitCores";
pub const CPU_REQUEST_ATTRIBUTE: &str = "cpuRequestCores";
pub const CONTAINER_SOURCE_ATTRIBUTE: &str = "source";
pub const TOOL_CONTAINER_SOURCE: &str = "tool";
pub const PLUGIN_MACHINE_ATTRIBUTE: &str = "plugin";
pub const DEVFILE_COMPONENT_ALIAS_ATTRIBUTE: &str = "component";

// Server attributes
pub const SERVER_INTERNAL_ATTRIBUTE: &str = "internal";
pub const ENDPOINT_PROTOCOL_ATTRIBUTE: &str = "protocol";
pub const ENDPOINT_PATH_ATTRIBUTE: &str = "path";
pub const ENDPOINT_PUBLIC_ATTRIBUTE: &str = "public";

// Command attributes
pub const COMMAND_PLUGIN_ATTRIBUTE: &str = "plugin";
pub const COMMAND_MACHINE_NAME_ATTRIBUTE: &str = "machineName";
pub const COMMAND_WORKING_DIRECTORY_ATTRIBUTE: &str = "workDir";
pub const CUSTOM_COMMAND_TYPE: &str = "custom";

// Workspace environment attributes
pub const WORKSPACE_TOOLING_EDITOR_ATTRIBUTE: &str = "editor";
pub const WORKSPACE_TOOLING_PLUGINS_ATTRIBUTE: &str = "plugins";
pub const PERSIST_VOLUMES_ATTRIBUTE: &str = "persistVolumes";
pub const MERGE_PLUGINS_ATTRIBUTE: &str = "mergePlugins";
pub const SECURE_EXPOSER_IMPL_PROPERTY: &str = "secureServerExposer";
pub const JWT_PROXY_SECURE_EXPOSER: &str = "jwtproxy";

// Devfile component types that are backed by plugins
pub const EDITOR_COMPONENT_TYPE: &str = "cheEditor";
pub const PLUGIN_COMPONENT_TYPE: &str = "chePlugin";

// Environment types
pub const KUBERNETES_ENVIRONMENT_TYPE: &str = "kubernetes";
pub const OPENSHIFT_ENVIRONMENT_TYPE: &str = "openshift";

// Volumes
pub const PROJECTS_VOLUME_NAME: &str = "projects";
pub const PLUGINS_VOLUME_NAME: &str = "plugins";

// Warning codes
pub const COMMAND_IN_PLUGIN_WITHOUT_CONTAINERS_WARNING_CODE: i32 = 44012;
pub const COMMAND_IN_PLUGIN_WITH_MULTIPLE_CONTAINERS_WARNING_CODE: i32 = 44013;

// Kubernetes limits
pub const MAX_CONTAINER_NAME_LENGTH: usize = 63;

#[test]
fn che_constants_macro_test() {
    assert_eq!("che", che!());
    assert_eq!("che.original_name", CHE_ORIGINAL_NAME_LABEL);
    assert_eq!("che.workspace.volume_name", CHE_VOLUME_NAME_LABEL);
}
