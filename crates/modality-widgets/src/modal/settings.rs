#![forbid(unsafe_code)]

//! Modal configuration: typed settings, partial options, and their merge.
//!
//! Settings are resolved exactly once, when a modal is constructed, with
//! the precedence
//!
//! 1. explicit [`ModalOptions`] passed by the caller,
//! 2. `data-*` attributes on the target element,
//! 3. [`ModalSettings::default`].
//!
//! Attribute values for boolean settings are parsed with [`parse_bool`];
//! string settings take the attribute verbatim. Unknown attribute keys are
//! ignored.
//!
//! Key names follow the camel-cased dataset form (`data-click-off-to-close`
//! → `clickOffToClose`). The short names used by older markup (`clickoff`,
//! `keyboard`, `bind`, `open`, `autoOpen`, `class`, `inner`, `outer`) are
//! accepted as aliases.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Zero-argument callback run after a transition.
pub type Callback = Rc<dyn Fn()>;

/// Delay between opening a modal and moving focus into it.
pub const DEFAULT_FOCUS_DELAY: Duration = Duration::from_millis(50);

/// Parse a boolean attribute value.
///
/// `"false"`, `"no"`, `"0"` and `""` (case-insensitive) are false; every
/// other value is true.
pub fn parse_bool(value: &str) -> bool {
    !matches!(
        value.to_ascii_lowercase().as_str(),
        "false" | "no" | "0" | ""
    )
}

/// A configurable setting, addressed by attribute/option key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    ModalClass,
    InnerClass,
    OpenClass,
    UserClass,
    Effect,
    AutoBind,
    ClickOffToClose,
    CloseOnEscape,
    OpenOnLoad,
    Enabled,
    Accessible,
    LockScroll,
    FocusDelay,
}

impl SettingKey {
    /// Look up a key by its camel-cased name or a legacy alias.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "modalClass" | "outer" => Self::ModalClass,
            "innerClass" | "inner" => Self::InnerClass,
            "openClass" => Self::OpenClass,
            "userClass" | "class" => Self::UserClass,
            "effect" => Self::Effect,
            "autoBind" | "bind" => Self::AutoBind,
            "clickOffToClose" | "clickOffClose" | "clickoff" => Self::ClickOffToClose,
            "closeOnEscape" | "keyboard" => Self::CloseOnEscape,
            "openOnLoad" | "autoOpen" | "open" => Self::OpenOnLoad,
            "enabled" => Self::Enabled,
            "accessible" => Self::Accessible,
            "lockScroll" => Self::LockScroll,
            "focusDelay" | "focusDelayMs" => Self::FocusDelay,
            _ => return None,
        };
        Some(key)
    }

    /// Canonical camel-cased name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ModalClass => "modalClass",
            Self::InnerClass => "innerClass",
            Self::OpenClass => "openClass",
            Self::UserClass => "userClass",
            Self::Effect => "effect",
            Self::AutoBind => "autoBind",
            Self::ClickOffToClose => "clickOffToClose",
            Self::CloseOnEscape => "closeOnEscape",
            Self::OpenOnLoad => "openOnLoad",
            Self::Enabled => "enabled",
            Self::Accessible => "accessible",
            Self::LockScroll => "lockScroll",
            Self::FocusDelay => "focusDelay",
        }
    }
}

/// Fully resolved modal settings.
#[derive(Clone)]
pub struct ModalSettings {
    /// Class of the outer wrapper.
    pub modal_class: String,
    /// Class of the inner content slot.
    pub inner_class: String,
    /// Class present on wrapper and body while open.
    pub open_class: String,
    /// Extra class added to the wrapper.
    pub user_class: String,
    /// Animation class added to the wrapper.
    pub effect: String,
    pub auto_bind: bool,
    pub click_off_to_close: bool,
    pub close_on_escape: bool,
    pub open_on_load: bool,
    /// Whether triggers start bound. This is the resolved starting value
    /// only; `Modal::is_enabled` reports the live state after
    /// `enable()`/`disable()`.
    pub enabled: bool,
    /// Focus management, `aria-hidden` and `tabindex` handling.
    pub accessible: bool,
    /// `overflow: hidden` on the body while open.
    pub lock_scroll: bool,
    pub focus_delay: Duration,
    pub on_open: Option<Callback>,
    pub on_close: Option<Callback>,
}

impl Default for ModalSettings {
    fn default() -> Self {
        Self {
            modal_class: "modality-modal".to_owned(),
            inner_class: "mm-wrap".to_owned(),
            open_class: "mm-show".to_owned(),
            user_class: String::new(),
            effect: String::new(),
            auto_bind: true,
            click_off_to_close: true,
            close_on_escape: true,
            open_on_load: false,
            enabled: true,
            accessible: true,
            lock_scroll: true,
            focus_delay: DEFAULT_FOCUS_DELAY,
            on_open: None,
            on_close: None,
        }
    }
}

impl fmt::Debug for ModalSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalSettings")
            .field("modal_class", &self.modal_class)
            .field("inner_class", &self.inner_class)
            .field("open_class", &self.open_class)
            .field("user_class", &self.user_class)
            .field("effect", &self.effect)
            .field("auto_bind", &self.auto_bind)
            .field("click_off_to_close", &self.click_off_to_close)
            .field("close_on_escape", &self.close_on_escape)
            .field("open_on_load", &self.open_on_load)
            .field("enabled", &self.enabled)
            .field("accessible", &self.accessible)
            .field("lock_scroll", &self.lock_scroll)
            .field("focus_delay", &self.focus_delay)
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

impl ModalSettings {
    /// Merge `options` over `dataset` over the defaults.
    pub fn resolve(options: &ModalOptions, dataset: &[(String, String)]) -> Self {
        let mut settings = Self::default();
        for (key, value) in dataset {
            settings.apply_attribute(key, value);
        }
        options.apply_to(&mut settings);
        settings
    }

    /// Apply one `data-*` attribute. Returns `false` when the key is unknown
    /// or the value could not be used.
    pub fn apply_attribute(&mut self, key: &str, value: &str) -> bool {
        let Some(setting) = SettingKey::from_name(key) else {
            tracing::trace!(key, "ignoring unknown modal data attribute");
            return false;
        };
        match setting {
            SettingKey::ModalClass => self.modal_class = value.to_owned(),
            SettingKey::InnerClass => self.inner_class = value.to_owned(),
            SettingKey::OpenClass => self.open_class = value.to_owned(),
            SettingKey::UserClass => self.user_class = value.to_owned(),
            SettingKey::Effect => self.effect = value.to_owned(),
            SettingKey::AutoBind => self.auto_bind = parse_bool(value),
            SettingKey::ClickOffToClose => self.click_off_to_close = parse_bool(value),
            SettingKey::CloseOnEscape => self.close_on_escape = parse_bool(value),
            SettingKey::OpenOnLoad => self.open_on_load = parse_bool(value),
            SettingKey::Enabled => self.enabled = parse_bool(value),
            SettingKey::Accessible => self.accessible = parse_bool(value),
            SettingKey::LockScroll => self.lock_scroll = parse_bool(value),
            SettingKey::FocusDelay => match value.trim().parse::<u64>() {
                Ok(ms) => self.focus_delay = Duration::from_millis(ms),
                Err(_) => {
                    tracing::trace!(key, value, "ignoring non-numeric focus delay");
                    return false;
                }
            },
        }
        true
    }

    /// Class attribute of the generated wrapper: modal class, effect and
    /// user class, skipping empty ones.
    pub fn wrapper_class(&self) -> String {
        [&self.modal_class, &self.effect, &self.user_class]
            .into_iter()
            .filter(|c| !c.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(feature = "serde")]
fn deserialize_millis<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

/// Caller-supplied partial settings. `None` fields fall through to the
/// element's data attributes and then to the defaults.
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ModalOptions {
    #[cfg_attr(feature = "serde", serde(alias = "outer"))]
    pub modal_class: Option<String>,
    #[cfg_attr(feature = "serde", serde(alias = "inner"))]
    pub inner_class: Option<String>,
    pub open_class: Option<String>,
    #[cfg_attr(feature = "serde", serde(alias = "class"))]
    pub user_class: Option<String>,
    pub effect: Option<String>,
    #[cfg_attr(feature = "serde", serde(alias = "bind"))]
    pub auto_bind: Option<bool>,
    #[cfg_attr(feature = "serde", serde(alias = "clickOffClose", alias = "clickoff"))]
    pub click_off_to_close: Option<bool>,
    #[cfg_attr(feature = "serde", serde(alias = "keyboard"))]
    pub close_on_escape: Option<bool>,
    #[cfg_attr(feature = "serde", serde(alias = "autoOpen", alias = "open"))]
    pub open_on_load: Option<bool>,
    pub enabled: Option<bool>,
    pub accessible: Option<bool>,
    pub lock_scroll: Option<bool>,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "focusDelayMs", deserialize_with = "deserialize_millis")
    )]
    pub focus_delay: Option<Duration>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub on_open: Option<Callback>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub on_close: Option<Callback>,
}

impl fmt::Debug for ModalOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalOptions")
            .field("modal_class", &self.modal_class)
            .field("inner_class", &self.inner_class)
            .field("open_class", &self.open_class)
            .field("user_class", &self.user_class)
            .field("effect", &self.effect)
            .field("auto_bind", &self.auto_bind)
            .field("click_off_to_close", &self.click_off_to_close)
            .field("close_on_escape", &self.close_on_escape)
            .field("open_on_load", &self.open_on_load)
            .field("enabled", &self.enabled)
            .field("accessible", &self.accessible)
            .field("lock_scroll", &self.lock_scroll)
            .field("focus_delay", &self.focus_delay)
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

impl ModalOptions {
    /// Options that override nothing.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modal_class(mut self, class: impl Into<String>) -> Self {
        self.modal_class = Some(class.into());
        self
    }

    pub fn inner_class(mut self, class: impl Into<String>) -> Self {
        self.inner_class = Some(class.into());
        self
    }

    pub fn open_class(mut self, class: impl Into<String>) -> Self {
        self.open_class = Some(class.into());
        self
    }

    pub fn user_class(mut self, class: impl Into<String>) -> Self {
        self.user_class = Some(class.into());
        self
    }

    pub fn effect(mut self, effect: impl Into<String>) -> Self {
        self.effect = Some(effect.into());
        self
    }

    pub fn auto_bind(mut self, value: bool) -> Self {
        self.auto_bind = Some(value);
        self
    }

    pub fn click_off_to_close(mut self, value: bool) -> Self {
        self.click_off_to_close = Some(value);
        self
    }

    pub fn close_on_escape(mut self, value: bool) -> Self {
        self.close_on_escape = Some(value);
        self
    }

    pub fn open_on_load(mut self, value: bool) -> Self {
        self.open_on_load = Some(value);
        self
    }

    pub fn enabled(mut self, value: bool) -> Self {
        self.enabled = Some(value);
        self
    }

    pub fn accessible(mut self, value: bool) -> Self {
        self.accessible = Some(value);
        self
    }

    pub fn lock_scroll(mut self, value: bool) -> Self {
        self.lock_scroll = Some(value);
        self
    }

    pub fn focus_delay(mut self, delay: Duration) -> Self {
        self.focus_delay = Some(delay);
        self
    }

    /// Run `f` after every open transition.
    pub fn on_open(mut self, f: impl Fn() + 'static) -> Self {
        self.on_open = Some(Rc::new(f));
        self
    }

    /// Run `f` after every close transition.
    pub fn on_close(mut self, f: impl Fn() + 'static) -> Self {
        self.on_close = Some(Rc::new(f));
        self
    }

    /// Overwrite every field of `settings` that these options set.
    pub fn apply_to(&self, settings: &mut ModalSettings) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }

        set(&mut settings.modal_class, &self.modal_class);
        set(&mut settings.inner_class, &self.inner_class);
        set(&mut settings.open_class, &self.open_class);
        set(&mut settings.user_class, &self.user_class);
        set(&mut settings.effect, &self.effect);
        set(&mut settings.auto_bind, &self.auto_bind);
        set(&mut settings.click_off_to_close, &self.click_off_to_close);
        set(&mut settings.close_on_escape, &self.close_on_escape);
        set(&mut settings.open_on_load, &self.open_on_load);
        set(&mut settings.enabled, &self.enabled);
        set(&mut settings.accessible, &self.accessible);
        set(&mut settings.lock_scroll, &self.lock_scroll);
        set(&mut settings.focus_delay, &self.focus_delay);
        if self.on_open.is_some() {
            settings.on_open = self.on_open.clone();
        }
        if self.on_close.is_some() {
            settings.on_close = self.on_close.clone();
        }
    }
}
