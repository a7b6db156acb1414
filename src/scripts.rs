//! Operational script lookup
//!
//! Resolves the fixed set of named helper scripts against either the
//! privileged installation or the caller's `$GPHOME` installation.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

use crate::config::InstallConfig;
use crate::error::{OmError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalScript {
    LocalBackup,
    LocalCheckConfig,
    LocalCheckInstall,
    LocalCheckUninstall,
    LocalCleanInstance,
    LocalCleanOsUser,
    LocalConfigHba,
    LocalConfigInstance,
    LocalInitInstance,
    LocalInstall,
    LocalRestore,
    LocalUninstall,
    LocalPreInstall,
    LocalCheckPreInstall,
    LocalUnPreInstall,
    LocalRoach,
    GaussUnInstall,
    GaussBackup,
    LocalCheckOs,
    LocalCheck,
    LocalPerformanceCheck,
    GaussCheckOs,
    GaussPreInstall,
    GaussReplace,
    GaussOm,
    UtilGaussStat,
    GaussCheck,
    LocalCollect,
    LocalKerberos,
    LocalExecuteSql,
    LocalStartInstance,
    LocalStopInstance,
    LocalCheckUpgrade,
    LocalCheckSshAgent,
    LocalUpgradeUtility,
    LocalUpgradeCm,
}

impl LocalScript {
    pub const ALL: [LocalScript; 36] = [
        LocalScript::LocalBackup,
        LocalScript::LocalCheckConfig,
        LocalScript::LocalCheckInstall,
        LocalScript::LocalCheckUninstall,
        LocalScript::LocalCleanInstance,
        LocalScript::LocalCleanOsUser,
        LocalScript::LocalConfigHba,
        LocalScript::LocalConfigInstance,
        LocalScript::LocalInitInstance,
        LocalScript::LocalInstall,
        LocalScript::LocalRestore,
        LocalScript::LocalUninstall,
        LocalScript::LocalPreInstall,
        LocalScript::LocalCheckPreInstall,
        LocalScript::LocalUnPreInstall,
        LocalScript::LocalRoach,
        LocalScript::GaussUnInstall,
        LocalScript::GaussBackup,
        LocalScript::LocalCheckOs,
        LocalScript::LocalCheck,
        LocalScript::LocalPerformanceCheck,
        LocalScript::GaussCheckOs,
        LocalScript::GaussPreInstall,
        LocalScript::GaussReplace,
        LocalScript::GaussOm,
        LocalScript::UtilGaussStat,
        LocalScript::GaussCheck,
        LocalScript::LocalCollect,
        LocalScript::LocalKerberos,
        LocalScript::LocalExecuteSql,
        LocalScript::LocalStartInstance,
        LocalScript::LocalStopInstance,
        LocalScript::LocalCheckUpgrade,
        LocalScript::LocalCheckSshAgent,
        LocalScript::LocalUpgradeUtility,
        LocalScript::LocalUpgradeCm,
    ];

    /// The lookup key callers use.
    pub fn name(&self) -> &'static str {
        match self {
            LocalScript::LocalBackup => "Local_Backup",
            LocalScript::LocalCheckConfig => "Local_Check_Config",
            LocalScript::LocalCheckInstall => "Local_Check_Install",
            LocalScript::LocalCheckUninstall => "Local_Check_Uninstall",
            LocalScript::LocalCleanInstance => "Local_Clean_Instance",
            LocalScript::LocalCleanOsUser => "Local_Clean_OsUser",
            LocalScript::LocalConfigHba => "Local_Config_Hba",
            LocalScript::LocalConfigInstance => "Local_Config_Instance",
            LocalScript::LocalInitInstance => "Local_Init_Instance",
            LocalScript::LocalInstall => "Local_Install",
            LocalScript::LocalRestore => "Local_Restore",
            LocalScript::LocalUninstall => "Local_Uninstall",
            LocalScript::LocalPreInstall => "Local_PreInstall",
            LocalScript::LocalCheckPreInstall => "Local_Check_PreInstall",
            LocalScript::LocalUnPreInstall => "Local_UnPreInstall",
            LocalScript::LocalRoach => "Local_Roach",
            LocalScript::GaussUnInstall => "Gauss_UnInstall",
            LocalScript::GaussBackup => "Gauss_Backup",
            LocalScript::LocalCheckOs => "Local_CheckOS",
            LocalScript::LocalCheck => "Local_Check",
            LocalScript::LocalPerformanceCheck => "LOCAL_PERFORMANCE_CHECK",
            LocalScript::GaussCheckOs => "Gauss_CheckOS",
            LocalScript::GaussPreInstall => "Gauss_PreInstall",
            LocalScript::GaussReplace => "Gauss_Replace",
            LocalScript::GaussOm => "Gauss_Om",
            LocalScript::UtilGaussStat => "UTIL_GAUSS_STAT",
            LocalScript::GaussCheck => "Gauss_Check",
            LocalScript::LocalCollect => "Local_Collect",
            LocalScript::LocalKerberos => "Local_Kerberos",
            LocalScript::LocalExecuteSql => "Local_Execute_Sql",
            LocalScript::LocalStartInstance => "Local_StartInstance",
            LocalScript::LocalStopInstance => "Local_StopInstance",
            LocalScript::LocalCheckUpgrade => "Local_Check_Upgrade",
            LocalScript::LocalCheckSshAgent => "Local_Check_SshAgent",
            LocalScript::LocalUpgradeUtility => "Local_Upgrade_Utility",
            LocalScript::LocalUpgradeCm => "Local_Upgrade_CM",
        }
    }

    /// Location relative to the script root.
    pub fn relative_path(&self) -> &'static str {
        match self {
            LocalScript::LocalBackup => "local/Backup.py",
            LocalScript::LocalCheckConfig => "local/CheckConfig.py",
            LocalScript::LocalCheckInstall => "local/CheckInstall.py",
            LocalScript::LocalCheckUninstall => "local/CheckUninstall.py",
            LocalScript::LocalCleanInstance => "local/CleanInstance.py",
            LocalScript::LocalCleanOsUser => "local/CleanOsUser.py",
            LocalScript::LocalConfigHba => "local/ConfigHba.py",
            LocalScript::LocalConfigInstance => "local/ConfigInstance.py",
            LocalScript::LocalInitInstance => "local/InitInstance.py",
            LocalScript::LocalInstall => "local/Install.py",
            LocalScript::LocalRestore => "local/Restore.py",
            LocalScript::LocalUninstall => "local/Uninstall.py",
            LocalScript::LocalPreInstall => "local/PreInstallUtility.py",
            LocalScript::LocalCheckPreInstall => "local/CheckPreInstall.py",
            LocalScript::LocalUnPreInstall => "local/UnPreInstallUtility.py",
            LocalScript::LocalRoach => "local/LocalRoach.py",
            LocalScript::GaussUnInstall => "gs_uninstall",
            LocalScript::GaussBackup => "gs_backup",
            LocalScript::LocalCheckOs => "local/LocalCheckOS.py",
            LocalScript::LocalCheck => "local/LocalCheck.py",
            LocalScript::LocalPerformanceCheck => "local/LocalPerformanceCheck.py",
            LocalScript::GaussCheckOs => "gs_checkos",
            LocalScript::GaussPreInstall => "gs_preinstall",
            LocalScript::GaussReplace => "gs_replace",
            LocalScript::GaussOm => "gs_om",
            LocalScript::UtilGaussStat => "gspylib/common/GaussStat.py",
            LocalScript::GaussCheck => "gs_check",
            LocalScript::LocalCollect => "local/LocalCollect.py",
            LocalScript::LocalKerberos => "local/KerberosUtility.py",
            LocalScript::LocalExecuteSql => "local/ExecuteSql.py",
            LocalScript::LocalStartInstance => "local/StartInstance.py",
            LocalScript::LocalStopInstance => "local/StopInstance.py",
            LocalScript::LocalCheckUpgrade => "local/CheckUpgrade.py",
            LocalScript::LocalCheckSshAgent => "local/CheckSshAgent.py",
            LocalScript::LocalUpgradeUtility => "local/UpgradeUtility.py",
            LocalScript::LocalUpgradeCm => "local/upgrade_cm_utility.py",
        }
    }
}

impl FromStr for LocalScript {
    type Err = OmError;

    fn from_str(name: &str) -> Result<Self> {
        LocalScript::ALL
            .iter()
            .copied()
            .find(|script| script.name() == name)
            .ok_or_else(|| OmError::UnknownScript(name.to_string()))
    }
}

impl fmt::Display for LocalScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Who is asking and where the tooling is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallContext {
    pub privileged: bool,
    pub gphome: Option<PathBuf>,
    pub package_root: PathBuf,
}

impl InstallContext {
    /// Builds the context for the current process; root group counts as privileged.
    pub fn detect(config: &InstallConfig) -> Self {
        // SAFETY: getgid has no preconditions and cannot fail.
        let gid = unsafe { libc::getgid() };
        Self {
            privileged: gid == 0,
            gphome: config.gphome.clone(),
            package_root: config.package_root.clone(),
        }
    }

    pub fn script_root(&self) -> Result<PathBuf> {
        if self.privileged {
            return Ok(self.package_root.clone());
        }
        self.gphome
            .as_ref()
            .map(|home| home.join("script"))
            .ok_or_else(|| OmError::MissingEnvVar("GPHOME".to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct ScriptLocator {
    context: InstallContext,
}

impl ScriptLocator {
    pub fn new(context: InstallContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &InstallContext {
        &self.context
    }

    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let root = self.context.script_root()?;
        let script = name.parse::<LocalScript>()?;
        Ok(root.join(script.relative_path()))
    }

    pub fn resolve_script(&self, script: LocalScript) -> Result<PathBuf> {
        Ok(self.context.script_root()?.join(script.relative_path()))
    }

    /// Invocation string for the named script.
    pub fn command(&self, name: &str) -> Result<String> {
        let path = self.resolve(name)?;
        debug!(script = name, path = %path.display(), "Resolved script");
        Ok(format!("python3 '{}'", path.display()))
    }
}
