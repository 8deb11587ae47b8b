//! Backend config file and command line construction
//!
//! Everything here is a pure function of its inputs: the same socket,
//! paths and settings always produce the same config text and launch specs.

use pulsewarden_config::{AudioSettings, BackendPaths};
use pulsewarden_host_api::LaunchSpec;
use std::fmt;
use std::path::{Path, PathBuf};

/// Sink created by the backend config and targeted by the control tool
pub const SINK_NAME: &str = "AAudioSink";

/// Backend config file, relative to the working directory
pub const CONFIG_FILE_NAME: &str = "default.pa";

/// Backend executable inside the native library directory
pub const BACKEND_BINARY: &str = "libpulseaudio.so";

/// Control tool inside the working directory
pub const CONTROL_TOOL: &str = "pactl";

/// Permission bits for a freshly created working directory
pub const WORKING_DIR_MODE: u32 = 0o771;

/// Unix socket address the audio server listens on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketEndpoint {
    path: PathBuf,
}

impl SocketEndpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Location of the generated backend config
pub fn config_path(paths: &BackendPaths) -> PathBuf {
    paths.working_dir.join(CONFIG_FILE_NAME)
}

/// Render the backend startup config
///
/// Lines are joined with `\n` and there is no trailing newline.
pub fn render_config(socket: &SocketEndpoint, settings: &AudioSettings) -> String {
    [
        format!(
            "load-module module-native-protocol-unix auth-anonymous=1 auth-cookie-enabled=0 socket=\"{}\"",
            socket
        ),
        format!(
            "load-module module-aaudio-sink volume={} performance_mode={}",
            format_gain(settings.volume),
            settings.performance_mode
        ),
        format!("set-default-sink {}", SINK_NAME),
    ]
    .join("\n")
}

/// Format a gain the way the JVM prints a float
///
/// Plain decimal with at least one fractional digit (`1.0`, not `1`) when
/// `1e-3 <= |v| < 1e7`, otherwise scientific notation such as `1.0E7`.
pub fn format_gain(volume: f32) -> String {
    if volume.is_nan() {
        return "NaN".to_string();
    }
    if volume.is_infinite() {
        let sign = if volume < 0.0 { "-" } else { "" };
        return format!("{}Infinity", sign);
    }

    let magnitude = volume.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return with_fraction(volume.to_string());
    }

    // `{:e}` gives the shortest round-trip mantissa, e.g. `1.5e7`
    let scientific = format!("{:e}", volume);
    match scientific.split_once('e') {
        Some((mantissa, exponent)) => {
            format!("{}E{}", with_fraction(mantissa.to_string()), exponent)
        }
        None => scientific,
    }
}

fn with_fraction(digits: String) -> String {
    if digits.contains('.') {
        digits
    } else {
        digits + ".0"
    }
}

/// Launch spec for the audio server itself
pub fn backend_launch(paths: &BackendPaths) -> LaunchSpec {
    let program = paths.native_lib_dir.join(BACKEND_BINARY);

    let argv = vec![
        program.display().to_string(),
        "--system=false".to_string(),
        "--disable-shm=true".to_string(),
        "--fail=false".to_string(),
        "-n".to_string(),
        format!("--file={}", CONFIG_FILE_NAME),
        "--daemonize=false".to_string(),
        "--use-pid-file=false".to_string(),
        "--exit-idle-time=-1".to_string(),
    ];

    let library_path = join_paths(&[
        paths.system_lib_dir.as_path(),
        paths.native_lib_dir.as_path(),
        paths.working_dir.join("modules").as_path(),
    ]);

    LaunchSpec::new(argv, &paths.working_dir)
        .with_env("LD_LIBRARY_PATH", library_path)
        .with_env("HOME", paths.working_dir.display().to_string())
        .with_env("TMPDIR", paths.tmp_dir.display().to_string())
}

/// Launch spec for one `suspend-sink` control tool invocation
pub fn control_launch(paths: &BackendPaths, socket: &SocketEndpoint, suspend: bool) -> LaunchSpec {
    let program = paths.working_dir.join(CONTROL_TOOL);

    let argv = vec![
        program.display().to_string(),
        "suspend-sink".to_string(),
        SINK_NAME.to_string(),
        suspend.to_string(),
    ];

    let library_path = join_paths(&[
        paths.system_lib_dir.as_path(),
        paths.native_lib_dir.as_path(),
    ]);

    LaunchSpec::new(argv, &paths.working_dir)
        .with_env("LD_LIBRARY_PATH", library_path)
        .with_env("HOME", paths.working_dir.display().to_string())
        .with_env("TMPDIR", paths.tmp_dir.display().to_string())
        .with_env("PULSE_SERVER", socket.to_string())
}

fn join_paths(paths: &[&Path]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> BackendPaths {
        BackendPaths {
            native_lib_dir: PathBuf::from("/data/app/lib/arm64"),
            working_dir: PathBuf::from("/data/files/pulseaudio"),
            tmp_dir: PathBuf::from("/data/files/tmp"),
            system_lib_dir: PathBuf::from("/system/lib64"),
        }
    }

    #[test]
    fn config_with_defaults() {
        let socket = SocketEndpoint::new("/tmp/pulse.sock");
        let config = render_config(&socket, &AudioSettings::default());

        assert_eq!(
            config,
            "load-module module-native-protocol-unix auth-anonymous=1 auth-cookie-enabled=0 socket=\"/tmp/pulse.sock\"\n\
             load-module module-aaudio-sink volume=1.0 performance_mode=1\n\
             set-default-sink AAudioSink"
        );
    }

    #[test]
    fn config_is_deterministic() {
        let socket = SocketEndpoint::new("/tmp/pulse.sock");
        let settings = AudioSettings {
            volume: 0.75,
            performance_mode: 2,
        };

        let a = render_config(&socket, &settings);
        let b = render_config(&socket.clone(), &settings.clone());
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert!(a.contains("volume=0.75 performance_mode=2"));
    }

    #[test]
    fn config_changes_with_inputs() {
        let socket = SocketEndpoint::new("/tmp/pulse.sock");
        let other = SocketEndpoint::new("/tmp/other.sock");
        let settings = AudioSettings::default();

        assert_ne!(render_config(&socket, &settings), render_config(&other, &settings));
    }

    #[test]
    fn gain_formatting() {
        assert_eq!(format_gain(1.0), "1.0");
        assert_eq!(format_gain(0.0), "0.0");
        assert_eq!(format_gain(3.0), "3.0");
        assert_eq!(format_gain(0.5), "0.5");
        assert_eq!(format_gain(-2.25), "-2.25");
        assert_eq!(format_gain(0.001), "0.001");
        assert_eq!(format_gain(9999999.0), "9999999.0");
    }

    #[test]
    fn gain_formatting_outside_decimal_range() {
        assert_eq!(format_gain(1e7), "1.0E7");
        assert_eq!(format_gain(1.5e7), "1.5E7");
        assert_eq!(format_gain(1e-4), "1.0E-4");
        assert_eq!(format_gain(-2.5e-5), "-2.5E-5");
        assert_eq!(format_gain(f32::INFINITY), "Infinity");
        assert_eq!(format_gain(f32::NEG_INFINITY), "-Infinity");
        assert_eq!(format_gain(f32::NAN), "NaN");
    }

    #[test]
    fn large_gain_reaches_config_in_scientific_form() {
        let settings = AudioSettings {
            volume: 1e7,
            performance_mode: 1,
        };
        let config = render_config(&SocketEndpoint::new("/tmp/pulse.sock"), &settings);
        assert!(config.contains("volume=1.0E7 performance_mode=1"));
    }

    #[test]
    fn backend_command_line() {
        let spec = backend_launch(&paths());

        assert_eq!(
            spec.command_line(),
            "/data/app/lib/arm64/libpulseaudio.so --system=false --disable-shm=true --fail=false \
             -n --file=default.pa --daemonize=false --use-pid-file=false --exit-idle-time=-1"
        );
        assert_eq!(spec.cwd, PathBuf::from("/data/files/pulseaudio"));
    }

    #[test]
    fn backend_environment() {
        let spec = backend_launch(&paths());

        assert_eq!(
            spec.env.get("LD_LIBRARY_PATH").map(String::as_str),
            Some("/system/lib64:/data/app/lib/arm64:/data/files/pulseaudio/modules")
        );
        assert_eq!(spec.env.get("HOME").map(String::as_str), Some("/data/files/pulseaudio"));
        assert_eq!(spec.env.get("TMPDIR").map(String::as_str), Some("/data/files/tmp"));
        assert!(!spec.env.contains_key("PULSE_SERVER"));
    }

    #[test]
    fn control_tool_invocation() {
        let socket = SocketEndpoint::new("/tmp/pulse.sock");

        let suspend = control_launch(&paths(), &socket, true);
        assert_eq!(
            suspend.command_line(),
            "/data/files/pulseaudio/pactl suspend-sink AAudioSink true"
        );

        let unsuspend = control_launch(&paths(), &socket, false);
        assert_eq!(unsuspend.args().last().map(String::as_str), Some("false"));

        assert_eq!(
            suspend.env.get("PULSE_SERVER").map(String::as_str),
            Some("/tmp/pulse.sock")
        );
        assert_eq!(
            suspend.env.get("LD_LIBRARY_PATH").map(String::as_str),
            Some("/system/lib64:/data/app/lib/arm64")
        );
        assert_eq!(suspend.env.get("HOME").map(String::as_str), Some("/data/files/pulseaudio"));
    }

    #[test]
    fn config_lives_in_working_dir() {
        assert_eq!(
            config_path(&paths()),
            PathBuf::from("/data/files/pulseaudio/default.pa")
        );
    }
}
