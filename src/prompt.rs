//! System prompt and task loading.
//!
//! An explicit `--system-prompt` file always wins. Without one, an embedded
//! default is used so the tool runs without any prompts directory: a compact
//! prompt in minimal mode for small models, a fuller one otherwise.

use std::path::Path;

use crate::error::{Result, RfxgenError};
use crate::feedback::FeedbackMode;

/// Compact prompt for small models that drift on long instructions
const MINIMAL_SYSTEM_PROMPT: &str = r#"You are a ReflexScript code generator. Generate syntactically correct ReflexScript code.

VALID UNITS: [m] [rad] [s] [ms] [Hz] [mps] [radps] [deg] [degC] [mm] [cm] [kg]
INVALID UNITS: [Nm] [rad/s] [m/s] - NO compound units with /

TEMPLATE:
```reflexscript
reflex name @(rate(100Hz), wcet(50us), stack(256bytes), bounded) {
    input:  sensor: i16[m]
    output: actuator: bool
    state:  counter: u8 = 0

    safety {
        input:  { sensor in 0..5000 }
        output: { actuator in {true, false} }
    }

    loop {
        if (sensor < 300) {
            actuator = false
        } else {
            actuator = true
        }
    }

    tests {
        reset_state
        test case1 inputs: { sensor = 200[m] }, expect: { actuator = false }
    }
}
```

Output code in a ```reflexscript block."#;

/// Full prompt with a worked example and the unit and syntax rules the
/// compiler is strictest about
const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an expert ReflexScript programmer for safety-critical embedded controllers. Generate complete, syntactically correct ReflexScript for the requested controller.

## WORKING EXAMPLE (use this as syntax reference)
```reflexscript
reflex example_controller @(rate(100Hz), wcet(50us), stack(256bytes), bounded) {
    input:  sensor: i16[m],
            trigger: bool
    output: actuator: bool,
            speed: i16[mps]
    state:  counter: u8 = 0,
            timer: u16 = 0

    safety {
        input:  { sensor in 0..5000, trigger in {true, false} }
        state:  { counter in 0..255, timer in 0..1000 }
        output: { actuator in {true, false}, speed in -1000..1000 }
        require: { sensor < 300 -> !actuator,
                   sensor < 300 -> speed == 0 }
    }

    loop {
        if (sensor < 300) {
            actuator = false
            speed = 0
            counter = clamp(counter + 1, 0, 255)
        } else {
            actuator = true
            speed = clamp(trigger ? 500 : 100, 0, 1000)
        }
        timer = (timer + 1) % 1000
    }

    tests {
        reset_state
        test safe_stop inputs: { sensor = 200[m], trigger = false },
                     expect: { actuator = false, speed = 0 }
        test normal_run inputs: { sensor = 1000[m], trigger = true },
                      expect: { actuator = true, speed = 500 }
    }
}
```

## VALID UNITS (only these are supported)
- **SI Core**: `[m]` `[rad]` `[s]` `[ms]` `[Hz]` `[mps]` `[radps]`
- **Angular**: `[deg]` (degrees)
- **Temperature**: `[degC]` `[degF]`
- **Length**: `[mm]` `[cm]` `[km]` `[ft]` `[in]`
- **Mass**: `[kg]` `[g]` `[lb]` `[oz]`

**INVALID units** (DO NOT USE): `[Nm]` `[rad/s]` `[m/s]` or any compound units with `/`

## CRITICAL SYNTAX RULES
1. **Types with units**: `i16[m]`, `i16[rad]`, `i16[mps]` - brackets contain ONLY a single unit name
2. **NO compound units**: `[rad/s]` is INVALID - use `[radps]` instead
3. **Float domains use brackets**: `[-1.0, 1.0]` NOT `..`
4. **Integer domains use `..`**: `0..100`
5. **Boolean domains use sets**: `{true, false}`
6. **MISRA-C parentheses**: `((a < b) || (c > d))` - wrap ALL comparisons
7. **Built-ins**: `clamp(val, min, max)`, `abs(val)`, `min(a, b)`, `max(a, b)`
8. **Safety block comes BEFORE loop block**
9. **No return statements** - use if/else for control flow
10. **Unit literals in tests**: `sensor = 200[m]` not `sensor = 200`

Output the complete program in a ```reflexscript block."#;

/// Resolve the system prompt: explicit file, else the built-in for the mode.
pub fn load_system_prompt(path: Option<&Path>, mode: FeedbackMode) -> Result<String> {
    match path {
        Some(path) => read_trimmed(path, "system prompt"),
        None => Ok(match mode {
            FeedbackMode::Minimal => MINIMAL_SYSTEM_PROMPT.to_string(),
            FeedbackMode::Rich => DEFAULT_SYSTEM_PROMPT.to_string(),
        }),
    }
}

/// Read the task description file.
pub fn load_task(path: &Path) -> Result<String> {
    let task = read_trimmed(path, "task prompt")?;
    if task.is_empty() {
        return Err(RfxgenError::Config(format!(
            "task prompt {} is empty",
            path.display()
        )));
    }
    Ok(task)
}

fn read_trimmed(path: &Path, what: &str) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        RfxgenError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read {} from {}: {}", what, path.display(), e),
        ))
    })?;
    Ok(content.trim().to_string())
}
