/// Built-in app definitions the studio can generate on demand. Each one is a
/// canned generation prompt with preferred window dimensions for the host
/// shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemAppDefinition {
    pub name: &'static str,
    pub icon: &'static str,
    pub width: u32,
    pub height: u32,
    pub prompt: &'static str,
}

pub fn system_apps() -> &'static [SystemAppDefinition] {
    SYSTEM_APPS
}

pub fn find_system_app(name: &str) -> Option<&'static SystemAppDefinition> {
    SYSTEM_APPS.iter().find(|definition| definition.name == name)
}

static SYSTEM_APPS: &[SystemAppDefinition] = &[
    SystemAppDefinition {
        name: "Calculator",
        icon: "🧮",
        width: 350,
        height: 450,
        prompt: "Create a fully functional Calculator app with a professional interface.\n\n\
LAYOUT:\n\
- Display screen at the top: dark background, white text, right-aligned numbers\n\
- Row 1: C, plus/minus, %, division. Row 2: 7 8 9 multiply. Row 3: 4 5 6 minus.\n\
- Row 4: 1 2 3 plus. Row 5: 0 spanning two columns, decimal point, equals.\n\
- Uniform 60px buttons with at most 5px spacing, centered in the window.\n\n\
FUNCTIONALITY:\n\
- All basic arithmetic with correct chaining, decimal support, sign toggle,\n\
  percentage, and clear. Division by zero shows \"Error\".\n\
- Show the selected operation in the display.\n\
- Keyboard support through app.onKey('keydown', ...): digits, + - * /\n\
  (mapped to the display glyphs), Enter/= for equals, Escape for clear,\n\
  Backspace to delete the last digit, and . for the decimal point.\n\
- Wrap the calculator in a container so it does not resize with the window.\n\n\
Define window[appNamespace].init to wire up state and the key handler; it is\n\
called automatically once the app is loaded.",
    },
    SystemAppDefinition {
        name: "Digital Clock",
        icon: "🕐",
        width: 400,
        height: 300,
        prompt: "Create a reliable Digital Clock app showing the current time with live updates.\n\n\
REQUIREMENTS:\n\
- Always use new Date() for the current time, never hardcoded values.\n\
- Update every second with setInterval, keeping the timer reference for\n\
  cleanup, and call the update function immediately on init.\n\
- Large centered HH:MM:SS display with padStart leading zeros, an AM/PM\n\
  indicator in 12-hour mode, and the full date below the time.\n\
- A toggle switch between 12 and 24 hour format that visually slides when\n\
  clicked and refreshes the display immediately.\n\
- Wrap time operations in try/catch and show a fallback message on error.\n\n\
Define window[appNamespace].init to start the timer and wire the toggle.",
    },
    SystemAppDefinition {
        name: "Cost Tracking",
        icon: "💰",
        width: 600,
        height: 500,
        prompt: "Create a Cost Tracking app that displays API usage costs from the shared\n\
data registry.\n\n\
REQUIREMENTS:\n\
- Read entries from window.dataRegistry.getData('cost-history'); each entry\n\
  has {timestamp, cost, description, prompt}.\n\
- Summary header with the total cost (4 decimal places, red, bold) and the\n\
  total number of API calls.\n\
- A table of entries with Date/Time, Cost, Description, and Request columns,\n\
  plus a reload button.\n\
- Subscribe to 'cost-history' changes so the table updates in real time, and\n\
  show a friendly message when no data is available yet.\n\
- Use app.getElementById for element lookups and prefix element ids.\n\n\
Define window[appNamespace].init to load data, subscribe, and wire events.",
    },
    SystemAppDefinition {
        name: "Data Registry",
        icon: "📊",
        width: 700,
        height: 500,
        prompt: "Create a Data Registry Browser app that lists every registered shared data\n\
object.\n\n\
REQUIREMENTS:\n\
- Header with the title \"Data Registry\" and a refresh button.\n\
- Table columns: Name, Description, Data Type, Current Value Preview, Actions.\n\
- Read entries with window.dataRegistry.getAllData(), descriptions and\n\
  structure from window.dataRegistry.getDataInfo(key).\n\
- Value previews: first 50 characters for strings, Array(n) for arrays,\n\
  Object(n keys) for objects, plain rendering for primitives.\n\
- Actions per row: a Console Log button dumping the value and its info, and\n\
  a Delete button that confirms before calling\n\
  window.dataRegistry.deleteData(key) and then reloads the table.\n\
- Show \"No shared data registered yet\" when the registry is empty and\n\
  subscribe to changes for automatic refresh.\n\n\
Define window[appNamespace].init to populate the table and wire events.",
    },
];
