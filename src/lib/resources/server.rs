use super::types::Server;

impl Server {
    pub fn is_functional(&self) -> bool {
        self.settings.is_reachable && self.settings.is_usable && !self.settings.force_disabled
    }

    pub fn ssh_target(&self) -> String {
        format!("{}@{}", self.user, self.ip)
    }
}
