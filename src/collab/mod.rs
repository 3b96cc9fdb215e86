mod ip;
mod observer;
mod radio;
mod sim;
mod store;

pub use ip::{IpProvisioner, ProvisioningRequest};
pub use observer::StationObserver;
pub use radio::{RadioControl, RadioHandle, ScanOffloadSettings};
pub use sim::{NoSim, SimAuthenticator};
pub use store::{ConfigStore, DisableReason};

pub struct Collaborators {
    pub radio: RadioHandle,
    pub store: Box<dyn ConfigStore + Send>,
    pub ip: Box<dyn IpProvisioner + Send>,
    pub sim: Box<dyn SimAuthenticator + Send>,
    pub observer: Box<dyn StationObserver + Send>,
}

impl Collaborators {
    pub fn new(
        radio: impl RadioControl + Send + 'static,
        store: impl ConfigStore + Send + 'static,
        ip: impl IpProvisioner + Send + 'static,
        observer: impl StationObserver + Send + 'static,
    ) -> Self {
        Self {
            radio: RadioHandle::new(radio),
            store: Box::new(store),
            ip: Box::new(ip),
            sim: Box::new(NoSim),
            observer: Box::new(observer),
        }
    }

    pub fn with_sim(mut self, sim: impl SimAuthenticator + Send + 'static) -> Self {
        self.sim = Box::new(sim);
        self
    }
}
