// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Reboot target selection and dispatch.

use std::fmt;

use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RebootTarget {
    #[default]
    System,
    Recovery,
    Hot,
    Poweroff,
    Bootloader,
    Download,
    // Vendor bootloader modes, passed through by name.
    Sboot,
    Tboot,
    Vboot,
    Wboot,
    Xboot,
    Yboot,
    Zboot,
}

impl RebootTarget {
    pub const ALL: [RebootTarget; 13] = [
        RebootTarget::System,
        RebootTarget::Recovery,
        RebootTarget::Hot,
        RebootTarget::Poweroff,
        RebootTarget::Bootloader,
        RebootTarget::Download,
        RebootTarget::Sboot,
        RebootTarget::Tboot,
        RebootTarget::Vboot,
        RebootTarget::Wboot,
        RebootTarget::Xboot,
        RebootTarget::Yboot,
        RebootTarget::Zboot,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            RebootTarget::System => "system",
            RebootTarget::Recovery => "recovery",
            RebootTarget::Hot => "hot",
            RebootTarget::Poweroff => "poweroff",
            RebootTarget::Bootloader => "bootloader",
            RebootTarget::Download => "download",
            RebootTarget::Sboot => "sboot",
            RebootTarget::Tboot => "tboot",
            RebootTarget::Vboot => "vboot",
            RebootTarget::Wboot => "wboot",
            RebootTarget::Xboot => "xboot",
            RebootTarget::Yboot => "yboot",
            RebootTarget::Zboot => "zboot",
        }
    }

    /// Case-sensitive exact match; anything else, including no token, is `System`.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            None | Some("") => RebootTarget::System,
            Some(token) => Self::ALL
                .into_iter()
                .find(|target| target.as_str() == token)
                .unwrap_or_else(|| {
                    tracing::warn!("Unknown reboot target {:?}, rebooting to system", token);
                    RebootTarget::System
                }),
        }
    }
}

impl fmt::Display for RebootTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform reboot call. On a device a successful call does not return.
pub trait RebootPrimitive {
    fn reboot(&mut self, target: RebootTarget) -> Result<()>;
}

/// Maps the token and issues the single reboot call.
pub fn dispatch<R: RebootPrimitive + ?Sized>(primitive: &mut R, token: Option<&str>) -> Result<RebootTarget> {
    let target = RebootTarget::from_token(token);
    tracing::info!("Rebooting to {}...", target);
    primitive.reboot(target)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<RebootTarget>);

    impl RebootPrimitive for Recorder {
        fn reboot(&mut self, target: RebootTarget) -> Result<()> {
            self.0.push(target);
            Ok(())
        }
    }

    #[test]
    fn test_default_target() {
        assert_eq!(RebootTarget::from_token(None), RebootTarget::System);
        assert_eq!(RebootTarget::from_token(Some("")), RebootTarget::System);
        assert_eq!(RebootTarget::from_token(Some("nonsense")), RebootTarget::System);
    }

    #[test]
    fn test_exact_case_sensitive_match() {
        assert_eq!(RebootTarget::from_token(Some("bootloader")), RebootTarget::Bootloader);
        assert_eq!(RebootTarget::from_token(Some("Bootloader")), RebootTarget::System);
        assert_eq!(RebootTarget::from_token(Some("bootloader ")), RebootTarget::System);
    }

    #[test]
    fn test_every_name_maps_back() {
        for target in RebootTarget::ALL {
            assert_eq!(RebootTarget::from_token(Some(target.as_str())), target);
        }
    }

    #[test]
    fn test_dispatch_calls_once() {
        let mut recorder = Recorder::default();
        let target = dispatch(&mut recorder, Some("download")).unwrap();
        assert_eq!(target, RebootTarget::Download);
        assert_eq!(recorder.0, vec![RebootTarget::Download]);
    }
}
