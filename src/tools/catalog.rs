//! The fixed set of actions the agent may perform and their typed invocations.

use serde_json::{json, Map, Value};

use crate::errors::DispatchError;
use crate::tools::schema::{ParamSpec, ParamType};

/// Prefix of the string returned by `task_complete`; the dispatcher ends the
/// run when it sees it.
pub const COMPLETION_PREFIX: &str = "TASK_COMPLETE: ";

/// Trust domain an action operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionDomain {
    Device,
    Host,
    Control,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    AndroidTap,
    AndroidType,
    AndroidHome,
    AndroidBack,
    AndroidSwipe,
    AndroidWait,
    HostReadFile,
    HostWriteFile,
    HostRunCommand,
    HostListDirectory,
    TaskComplete,
}

impl ActionKind {
    /// Registration order of the built-in catalog.
    pub const ALL: [ActionKind; 11] = [
        ActionKind::AndroidTap,
        ActionKind::AndroidType,
        ActionKind::AndroidHome,
        ActionKind::AndroidBack,
        ActionKind::AndroidSwipe,
        ActionKind::AndroidWait,
        ActionKind::HostReadFile,
        ActionKind::HostWriteFile,
        ActionKind::HostRunCommand,
        ActionKind::HostListDirectory,
        ActionKind::TaskComplete,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::AndroidTap => "android_tap",
            Self::AndroidType => "android_type",
            Self::AndroidHome => "android_home",
            Self::AndroidBack => "android_back",
            Self::AndroidSwipe => "android_swipe",
            Self::AndroidWait => "android_wait",
            Self::HostReadFile => "host_read_file",
            Self::HostWriteFile => "host_write_file",
            Self::HostRunCommand => "host_run_command",
            Self::HostListDirectory => "host_list_directory",
            Self::TaskComplete => "task_complete",
        }
    }

    pub fn domain(self) -> ActionDomain {
        match self {
            Self::AndroidTap
            | Self::AndroidType
            | Self::AndroidHome
            | Self::AndroidBack
            | Self::AndroidSwipe
            | Self::AndroidWait => ActionDomain::Device,
            Self::HostReadFile
            | Self::HostWriteFile
            | Self::HostRunCommand
            | Self::HostListDirectory => ActionDomain::Host,
            Self::TaskComplete => ActionDomain::Control,
        }
    }

    /// Description shown to the model for the built-in registration.
    pub fn description(self) -> &'static str {
        match self {
            Self::AndroidTap => "Tap the Android screen at pixel coordinates (x, y). Use the center point of an element from the screen context.",
            Self::AndroidType => "Type text on the Android device. If x and y are given, tap there first to focus the input field.",
            Self::AndroidHome => "Press the Android HOME button.",
            Self::AndroidBack => "Press the Android BACK button.",
            Self::AndroidSwipe => "Swipe from (x1, y1) to (x2, y2) on the Android screen. Useful for scrolling.",
            Self::AndroidWait => "Wait for the given number of seconds, e.g. while an app is loading.",
            Self::HostReadFile => "Read a text file on the host computer and return its contents.",
            Self::HostWriteFile => "Write content to a file on the host computer, creating parent directories as needed.",
            Self::HostRunCommand => "Run a shell command on the host computer and return its output. Long-running commands are killed after a timeout.",
            Self::HostListDirectory => "List the entries of a directory on the host computer.",
            Self::TaskComplete => "Signal that the user's goal has been achieved. Call this exactly once, with a short summary, when done.",
        }
    }

    /// Declared parameter list for this action.
    pub fn spec(self) -> ActionSpec {
        let spec = ActionSpec::new(self);
        match self {
            Self::AndroidTap => spec
                .param(ParamSpec::new("x", ParamType::Integer).describe("X coordinate in pixels"))
                .param(ParamSpec::new("y", ParamType::Integer).describe("Y coordinate in pixels")),
            Self::AndroidType => spec
                .param(ParamSpec::new("text", ParamType::String).describe("Text to type"))
                .param(
                    ParamSpec::new("x", ParamType::optional(ParamType::Integer))
                        .describe("X coordinate of the field to focus first"),
                )
                .param(
                    ParamSpec::new("y", ParamType::optional(ParamType::Integer))
                        .describe("Y coordinate of the field to focus first"),
                ),
            Self::AndroidHome | Self::AndroidBack => spec,
            Self::AndroidSwipe => spec
                .param(ParamSpec::new("x1", ParamType::Integer))
                .param(ParamSpec::new("y1", ParamType::Integer))
                .param(ParamSpec::new("x2", ParamType::Integer))
                .param(ParamSpec::new("y2", ParamType::Integer))
                .param(ParamSpec::new("duration_ms", ParamType::Integer).with_default(json!(300))),
            Self::AndroidWait => {
                spec.param(ParamSpec::new("seconds", ParamType::Float).with_default(json!(2.0)))
            }
            Self::HostReadFile => spec.param(ParamSpec::new("filepath", ParamType::String)),
            Self::HostWriteFile => spec
                .param(ParamSpec::new("filepath", ParamType::String))
                .param(ParamSpec::new("content", ParamType::String)),
            Self::HostRunCommand => spec.param(ParamSpec::new("command", ParamType::String)),
            Self::HostListDirectory => spec
                .param(ParamSpec::new("directory", ParamType::String).with_default(json!("."))),
            Self::TaskComplete => spec.param(
                ParamSpec::new("summary", ParamType::String)
                    .describe("Short summary of what was accomplished"),
            ),
        }
    }
}

/// A named action with its ordered parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSpec {
    pub kind: ActionKind,
    pub params: Vec<ParamSpec>,
}

impl ActionSpec {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// One typed call of a catalog action.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    AndroidTap { x: i64, y: i64 },
    AndroidType { text: String, x: Option<i64>, y: Option<i64> },
    AndroidHome,
    AndroidBack,
    AndroidSwipe { x1: i64, y1: i64, x2: i64, y2: i64, duration_ms: i64 },
    AndroidWait { seconds: f64 },
    HostReadFile { filepath: String },
    HostWriteFile { filepath: String, content: String },
    HostRunCommand { command: String },
    HostListDirectory { directory: String },
    TaskComplete { summary: String },
}

impl ToolInvocation {
    /// Parse model-supplied arguments against `spec`, applying declared defaults.
    pub fn parse(spec: &ActionSpec, args: &Value) -> Result<Self, DispatchError> {
        let args = ArgReader::new(spec, args)?;
        Ok(match spec.kind {
            ActionKind::AndroidTap => Self::AndroidTap {
                x: args.int("x")?,
                y: args.int("y")?,
            },
            ActionKind::AndroidType => {
                let (x, y) = (args.opt_int("x")?, args.opt_int("y")?);
                if x.is_some() != y.is_some() {
                    return Err(args.error(
                        "x and y must be given together to focus a field".to_string(),
                    ));
                }
                Self::AndroidType {
                    text: args.string("text")?,
                    x,
                    y,
                }
            }
            ActionKind::AndroidHome => Self::AndroidHome,
            ActionKind::AndroidBack => Self::AndroidBack,
            ActionKind::AndroidSwipe => Self::AndroidSwipe {
                x1: args.int("x1")?,
                y1: args.int("y1")?,
                x2: args.int("x2")?,
                y2: args.int("y2")?,
                duration_ms: args.int("duration_ms")?,
            },
            ActionKind::AndroidWait => Self::AndroidWait {
                seconds: args.float("seconds")?,
            },
            ActionKind::HostReadFile => Self::HostReadFile {
                filepath: args.string("filepath")?,
            },
            ActionKind::HostWriteFile => Self::HostWriteFile {
                filepath: args.string("filepath")?,
                content: args.string("content")?,
            },
            ActionKind::HostRunCommand => Self::HostRunCommand {
                command: args.string("command")?,
            },
            ActionKind::HostListDirectory => Self::HostListDirectory {
                directory: args.string("directory")?,
            },
            ActionKind::TaskComplete => Self::TaskComplete {
                summary: args.string("summary")?,
            },
        })
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::AndroidTap { .. } => ActionKind::AndroidTap,
            Self::AndroidType { .. } => ActionKind::AndroidType,
            Self::AndroidHome => ActionKind::AndroidHome,
            Self::AndroidBack => ActionKind::AndroidBack,
            Self::AndroidSwipe { .. } => ActionKind::AndroidSwipe,
            Self::AndroidWait { .. } => ActionKind::AndroidWait,
            Self::HostReadFile { .. } => ActionKind::HostReadFile,
            Self::HostWriteFile { .. } => ActionKind::HostWriteFile,
            Self::HostRunCommand { .. } => ActionKind::HostRunCommand,
            Self::HostListDirectory { .. } => ActionKind::HostListDirectory,
            Self::TaskComplete { .. } => ActionKind::TaskComplete,
        }
    }
}

/// The control action: produces the completion marker.
pub fn task_complete(summary: &str) -> String {
    format!("{COMPLETION_PREFIX}{summary}")
}

/// Summary carried by a completion marker, if `result` is one.
pub fn completion_summary(result: &str) -> Option<&str> {
    result.strip_prefix(COMPLETION_PREFIX)
}

/// Reads arguments by declared parameter name.
struct ArgReader<'a> {
    spec: &'a ActionSpec,
    args: Map<String, Value>,
}

impl<'a> ArgReader<'a> {
    fn new(spec: &'a ActionSpec, args: &Value) -> Result<Self, DispatchError> {
        let args = match args {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                return Err(DispatchError::invalid(
                    spec.name(),
                    format!("arguments must be a JSON object, got {other}"),
                ))
            }
        };
        if let Some(unexpected) = args
            .keys()
            .find(|k| !spec.params.iter().any(|p| p.name == k.as_str()))
        {
            return Err(DispatchError::invalid(
                spec.name(),
                format!("unexpected parameter '{unexpected}'"),
            ));
        }
        Ok(Self { spec, args })
    }

    /// Supplied value, else the declared default. `null` counts as absent.
    fn value(&self, name: &str) -> Result<Option<Value>, DispatchError> {
        let param = self
            .spec
            .params
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| self.error(format!("undeclared parameter '{name}'")))?;
        match self.args.get(name) {
            Some(v) if !v.is_null() => Ok(Some(v.clone())),
            _ if param.default.is_some() => Ok(param.default.clone()),
            _ if param.ty.is_optional() => Ok(None),
            _ => Err(self.error(format!("missing required parameter '{name}'"))),
        }
    }

    fn required(&self, name: &str) -> Result<Value, DispatchError> {
        self.value(name)?
            .ok_or_else(|| self.error(format!("missing required parameter '{name}'")))
    }

    fn int(&self, name: &str) -> Result<i64, DispatchError> {
        let v = self.required(name)?;
        self.to_int(name, &v)
    }

    fn opt_int(&self, name: &str) -> Result<Option<i64>, DispatchError> {
        self.value(name)?.map(|v| self.to_int(name, &v)).transpose()
    }

    fn float(&self, name: &str) -> Result<f64, DispatchError> {
        let v = self.required(name)?;
        let parsed = match &v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|f| f.is_finite())
            .ok_or_else(|| self.error(format!("parameter '{name}' must be a number, got {v}")))
    }

    fn string(&self, name: &str) -> Result<String, DispatchError> {
        match self.required(name)? {
            Value::String(s) => Ok(s),
            v @ (Value::Number(_) | Value::Bool(_)) => Ok(v.to_string()),
            v => Err(self.error(format!("parameter '{name}' must be a string, got {v}"))),
        }
    }

    fn to_int(&self, name: &str, v: &Value) -> Result<i64, DispatchError> {
        let parsed = match v {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| self.error(format!("parameter '{name}' must be an integer, got {v}")))
    }

    fn error(&self, reason: String) -> DispatchError {
        DispatchError::invalid(self.spec.name(), reason)
    }
}
