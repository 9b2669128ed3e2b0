//! User Preferences
//!
//! Five typed sections persisted under one key. Loading merges whatever was
//! stored over the defaults, so new settings appear with their default
//! value and old files keep working.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AccountError, Result};
use crate::store::{KeyValueStore, StoreExt, StoreKey};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub dark_mode: bool,
    pub compact_view: bool,
    pub show_price_decimals: bool,
    pub color_scheme: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            dark_mode: true,
            compact_view: false,
            show_price_decimals: true,
            color_scheme: "Cyan".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub live_price_updates: bool,
    pub ai_insights: bool,
    pub auto_refresh: bool,
    pub update_interval: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            live_price_updates: true,
            ai_insights: true,
            auto_refresh: true,
            update_interval: "Every 3 seconds".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub push_notifications: bool,
    pub email_alerts: bool,
    pub sound_alerts: bool,
    /// 0-100
    pub notification_volume: u8,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            push_notifications: true,
            email_alerts: false,
            sound_alerts: true,
            notification_volume: 75,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    pub encrypt_sensitive_data: bool,
    pub hide_balances: bool,
    pub api_key_protection: bool,
    pub session_timeout: String,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            encrypt_sensitive_data: true,
            hide_balances: false,
            api_key_protection: true,
            session_timeout: "30 minutes".into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    pub developer_mode: bool,
    pub beta_features: bool,
    pub performance_mode: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub display: DisplaySettings,
    pub data: DataSettings,
    pub notifications: NotificationSettings,
    pub privacy: PrivacySettings,
    pub advanced: AdvancedSettings,
}

/// A single setting change, e.g. `{"key": "dark_mode", "value": false}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "snake_case")]
pub enum SettingUpdate {
    DarkMode(bool),
    CompactView(bool),
    ShowPriceDecimals(bool),
    ColorScheme(String),
    LivePriceUpdates(bool),
    AiInsights(bool),
    AutoRefresh(bool),
    UpdateInterval(String),
    PushNotifications(bool),
    EmailAlerts(bool),
    SoundAlerts(bool),
    NotificationVolume(u8),
    EncryptSensitiveData(bool),
    HideBalances(bool),
    ApiKeyProtection(bool),
    SessionTimeout(String),
    DeveloperMode(bool),
    BetaFeatures(bool),
    PerformanceMode(bool),
}

impl Settings {
    pub fn apply(&mut self, update: SettingUpdate) -> Result<()> {
        use SettingUpdate as U;
        match update {
            U::DarkMode(v) => self.display.dark_mode = v,
            U::CompactView(v) => self.display.compact_view = v,
            U::ShowPriceDecimals(v) => self.display.show_price_decimals = v,
            U::ColorScheme(v) => self.display.color_scheme = v,
            U::LivePriceUpdates(v) => self.data.live_price_updates = v,
            U::AiInsights(v) => self.data.ai_insights = v,
            U::AutoRefresh(v) => self.data.auto_refresh = v,
            U::UpdateInterval(v) => self.data.update_interval = v,
            U::PushNotifications(v) => self.notifications.push_notifications = v,
            U::EmailAlerts(v) => self.notifications.email_alerts = v,
            U::SoundAlerts(v) => self.notifications.sound_alerts = v,
            U::NotificationVolume(v) if v > 100 => {
                return Err(AccountError::InvalidInput(format!(
                    "notification volume must be 0-100, got {v}"
                )));
            }
            U::NotificationVolume(v) => self.notifications.notification_volume = v,
            U::EncryptSensitiveData(v) => self.privacy.encrypt_sensitive_data = v,
            U::HideBalances(v) => self.privacy.hide_balances = v,
            U::ApiKeyProtection(v) => self.privacy.api_key_protection = v,
            U::SessionTimeout(v) => self.privacy.session_timeout = v,
            U::DeveloperMode(v) => self.advanced.developer_mode = v,
            U::BetaFeatures(v) => self.advanced.beta_features = v,
            U::PerformanceMode(v) => self.advanced.performance_mode = v,
        }
        Ok(())
    }
}

pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored settings over defaults; unreadable data yields defaults
    pub fn load(&self) -> Result<Settings> {
        Ok(self.store.load_json(&StoreKey::Settings)?.unwrap_or_default())
    }

    pub fn update(&self, update: SettingUpdate) -> Result<Settings> {
        self.store.update_json(&StoreKey::Settings, |settings: &mut Settings| {
            settings.apply(update)?;
            Ok(settings.clone())
        })
    }

    pub fn reset(&self) -> Result<Settings> {
        let defaults = Settings::default();
        self.store.save_json(&StoreKey::Settings, &defaults)?;
        Ok(defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn settings_store() -> (Arc<MemoryStore>, SettingsStore) {
        let store = Arc::new(MemoryStore::new());
        (Arc::clone(&store), SettingsStore::new(store))
    }

    #[test]
    fn test_defaults() {
        let (_, settings) = settings_store();
        let s = settings.load().unwrap();
        assert!(s.display.dark_mode);
        assert_eq!(s.display.color_scheme, "Cyan");
        assert_eq!(s.data.update_interval, "Every 3 seconds");
        assert_eq!(s.notifications.notification_volume, 75);
        assert_eq!(s.privacy.session_timeout, "30 minutes");
        assert!(!s.advanced.developer_mode);
    }

    #[test]
    fn test_partial_data_merges_over_defaults() {
        let (raw, settings) = settings_store();
        raw.set(
            "ct_settings_v1",
            r#"{"display":{"dark_mode":false},"unknown_section":{"x":1}}"#.into(),
        )
        .unwrap();

        let s = settings.load().unwrap();
        assert!(!s.display.dark_mode);
        assert!(s.display.show_price_decimals);
        assert_eq!(s.notifications, NotificationSettings::default());
    }

    #[test]
    fn test_corrupt_data_yields_defaults() {
        let (raw, settings) = settings_store();
        raw.set("ct_settings_v1", "{{{".into()).unwrap();
        assert_eq!(settings.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_update_persists_and_reset_restores() {
        let (_, settings) = settings_store();
        let update: SettingUpdate =
            serde_json::from_str(r#"{"key":"hide_balances","value":true}"#).unwrap();
        settings.update(update).unwrap();
        settings.update(SettingUpdate::NotificationVolume(20)).unwrap();

        let s = settings.load().unwrap();
        assert!(s.privacy.hide_balances);
        assert_eq!(s.notifications.notification_volume, 20);

        assert_eq!(settings.reset().unwrap(), Settings::default());
        assert_eq!(settings.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_volume_out_of_range() {
        let (_, settings) = settings_store();
        assert!(settings.update(SettingUpdate::NotificationVolume(101)).is_err());
        assert_eq!(settings.load().unwrap().notifications.notification_volume, 75);
    }
}
