use crate::types::{IpConfiguration, NetworkId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProvisioningRequest {
    Dhcp { network_id: NetworkId },
    Static(IpConfiguration),
}

// Results come back asynchronously as `IpEvent`s queued on the station.
pub trait IpProvisioner {
    fn start(&mut self, request: ProvisioningRequest);
    fn stop(&mut self);
    fn complete_pre_dhcp_action(&mut self);
}
