//! In-memory fake session for handler tests
//!
//! Each fake service keeps entities in memory, records every request it
//! receives, and can be told to fail its next call.

use crate::error::{ApiError, ProviderError, Result};
use crate::ibm::cr::{ContainerRegistryApi, NamespaceDetails};
use crate::ibm::dns::{
    DnsSvcsApi, LoadBalancer, LoadBalancerList, LoadBalancerRequest, Monitor, MonitorList,
    MonitorRequest, PageOptions,
};
use crate::ibm::vpc::{
    ListVpnGatewaysOptions, PageLink, PublicIp, Reference, VpcApi, VpnGateway,
    VpnGatewayCollection, VpnGatewayMember, VpnGatewayPatch, VpnGatewayPrototype,
};
use crate::ibm::ClientSession;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

const CREATED: &str = "2024-01-01T00:00:00Z";
const MODIFIED: &str = "2024-01-02T00:00:00Z";

/// A request the fake received
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateMonitor(String, MonitorRequest),
    GetMonitor(String, String),
    UpdateMonitor(String, String, MonitorRequest),
    DeleteMonitor(String, String),
    ListMonitors(String, PageOptions),
    CreateLoadBalancer(String, String, LoadBalancerRequest),
    GetLoadBalancer(String, String, String),
    UpdateLoadBalancer(String, String, String, LoadBalancerRequest),
    DeleteLoadBalancer(String, String, String),
    ListLoadBalancers(String, String, PageOptions),
    ListVpnGateways(ListVpnGatewaysOptions),
    CreateVpnGateway(VpnGatewayPrototype),
    GetVpnGateway(String),
    UpdateVpnGateway(String, VpnGatewayPatch),
    DeleteVpnGateway(String),
    ListNamespaces,
    CreateNamespace(String, Option<String>),
    DeleteNamespace(String),
}

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<Call>>,
    fail_next: Mutex<Option<ApiError>>,
    next_id: AtomicUsize,
}

impl Recorder {
    fn record(&self, call: Call) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn new_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

fn page<T: Clone>(items: &[T], page: &PageOptions) -> (Vec<T>, i64) {
    let offset = page.offset.unwrap_or(0).max(0) as usize;
    let limit = page.limit.unwrap_or(200).max(1) as usize;
    let slice = items.iter().skip(offset).take(limit).cloned().collect();
    (slice, items.len() as i64)
}

#[derive(Default)]
pub struct FakeDns {
    recorder: Recorder,
    pub monitors: Mutex<Vec<(String, Monitor)>>,
    pub load_balancers: Mutex<Vec<(String, String, LoadBalancer)>>,
}

fn merge_monitor(monitor: &mut Monitor, body: &MonitorRequest) {
    macro_rules! merge {
        ($($field:ident),*) => {
            $(if body.$field.is_some() { monitor.$field = body.$field.clone(); })*
        };
    }
    merge!(
        name,
        description,
        monitor_type,
        port,
        interval,
        retries,
        timeout,
        method,
        path,
        headers,
        allow_insecure,
        expected_codes,
        expected_body
    );
    monitor.modified_on = Some(MODIFIED.to_string());
}

fn merge_load_balancer(lb: &mut LoadBalancer, body: &LoadBalancerRequest) {
    if body.name.is_some() {
        lb.name = body.name.clone();
    }
    if body.description.is_some() {
        lb.description = body.description.clone();
    }
    if body.enabled.is_some() {
        lb.enabled = body.enabled;
    }
    if body.ttl.is_some() {
        lb.ttl = body.ttl;
    }
    if body.fallback_pool.is_some() {
        lb.fallback_pool = body.fallback_pool.clone();
    }
    if let Some(pools) = &body.default_pools {
        lb.default_pools = pools.clone();
    }
    if let Some(az_pools) = &body.az_pools {
        lb.az_pools = az_pools.clone();
    }
    lb.modified_on = Some(MODIFIED.to_string());
}

impl FakeDns {
    pub fn calls(&self) -> Vec<Call> {
        self.recorder.calls.lock().unwrap().clone()
    }

    pub fn fail_next(&self, err: ApiError) {
        *self.recorder.fail_next.lock().unwrap() = Some(err);
    }

    pub fn insert_monitor(&self, instance_id: &str, monitor: Monitor) {
        self.monitors
            .lock()
            .unwrap()
            .push((instance_id.to_string(), monitor));
    }

    pub fn insert_load_balancer(&self, instance_id: &str, zone_id: &str, lb: LoadBalancer) {
        self.load_balancers.lock().unwrap().push((
            instance_id.to_string(),
            zone_id.to_string(),
            lb,
        ));
    }

    fn missing(what: &str, id: &str) -> ApiError {
        ApiError::not_found(format!("{} {} not found", what, id)).with_body("{\"code\":\"not_found\"}")
    }
}

#[async_trait]
impl DnsSvcsApi for FakeDns {
    async fn create_monitor(
        &self,
        instance_id: &str,
        body: &MonitorRequest,
    ) -> Result<Monitor, ApiError> {
        self.recorder
            .record(Call::CreateMonitor(instance_id.to_string(), body.clone()))?;
        let mut monitor = Monitor {
            id: self.recorder.new_id("monitor"),
            created_on: Some(CREATED.to_string()),
            ..Default::default()
        };
        merge_monitor(&mut monitor, body);
        monitor.modified_on = Some(CREATED.to_string());
        self.insert_monitor(instance_id, monitor.clone());
        Ok(monitor)
    }

    async fn get_monitor(&self, instance_id: &str, monitor_id: &str) -> Result<Monitor, ApiError> {
        self.recorder.record(Call::GetMonitor(
            instance_id.to_string(),
            monitor_id.to_string(),
        ))?;
        self.monitors
            .lock()
            .unwrap()
            .iter()
            .find(|(inst, m)| inst == instance_id && m.id == monitor_id)
            .map(|(_, m)| m.clone())
            .ok_or_else(|| Self::missing("monitor", monitor_id))
    }

    async fn update_monitor(
        &self,
        instance_id: &str,
        monitor_id: &str,
        body: &MonitorRequest,
    ) -> Result<Monitor, ApiError> {
        self.recorder.record(Call::UpdateMonitor(
            instance_id.to_string(),
            monitor_id.to_string(),
            body.clone(),
        ))?;
        let mut monitors = self.monitors.lock().unwrap();
        let (_, monitor) = monitors
            .iter_mut()
            .find(|(inst, m)| inst == instance_id && m.id == monitor_id)
            .ok_or_else(|| Self::missing("monitor", monitor_id))?;
        merge_monitor(monitor, body);
        Ok(monitor.clone())
    }

    async fn delete_monitor(&self, instance_id: &str, monitor_id: &str) -> Result<(), ApiError> {
        self.recorder.record(Call::DeleteMonitor(
            instance_id.to_string(),
            monitor_id.to_string(),
        ))?;
        let mut monitors = self.monitors.lock().unwrap();
        let before = monitors.len();
        monitors.retain(|(inst, m)| !(inst == instance_id && m.id == monitor_id));
        if monitors.len() == before {
            return Err(Self::missing("monitor", monitor_id));
        }
        Ok(())
    }

    async fn list_monitors(
        &self,
        instance_id: &str,
        page_options: &PageOptions,
    ) -> Result<MonitorList, ApiError> {
        self.recorder
            .record(Call::ListMonitors(instance_id.to_string(), *page_options))?;
        let all: Vec<Monitor> = self
            .monitors
            .lock()
            .unwrap()
            .iter()
            .filter(|(inst, _)| inst == instance_id)
            .map(|(_, m)| m.clone())
            .collect();
        let (monitors, total) = page(&all, page_options);
        Ok(MonitorList {
            count: Some(monitors.len() as i64),
            monitors,
            offset: page_options.offset,
            limit: page_options.limit,
            total_count: Some(total),
        })
    }

    async fn create_load_balancer(
        &self,
        instance_id: &str,
        zone_id: &str,
        body: &LoadBalancerRequest,
    ) -> Result<LoadBalancer, ApiError> {
        self.recorder.record(Call::CreateLoadBalancer(
            instance_id.to_string(),
            zone_id.to_string(),
            body.clone(),
        ))?;
        let mut lb = LoadBalancer {
            id: self.recorder.new_id("glb"),
            health: Some("HEALTHY".to_string()),
            enabled: Some(true),
            ttl: Some(60),
            created_on: Some(CREATED.to_string()),
            ..Default::default()
        };
        merge_load_balancer(&mut lb, body);
        self.insert_load_balancer(instance_id, zone_id, lb.clone());
        Ok(lb)
    }

    async fn get_load_balancer(
        &self,
        instance_id: &str,
        zone_id: &str,
        lb_id: &str,
    ) -> Result<LoadBalancer, ApiError> {
        self.recorder.record(Call::GetLoadBalancer(
            instance_id.to_string(),
            zone_id.to_string(),
            lb_id.to_string(),
        ))?;
        self.load_balancers
            .lock()
            .unwrap()
            .iter()
            .find(|(inst, zone, lb)| inst == instance_id && zone == zone_id && lb.id == lb_id)
            .map(|(_, _, lb)| lb.clone())
            .ok_or_else(|| Self::missing("load balancer", lb_id))
    }

    async fn update_load_balancer(
        &self,
        instance_id: &str,
        zone_id: &str,
        lb_id: &str,
        body: &LoadBalancerRequest,
    ) -> Result<LoadBalancer, ApiError> {
        self.recorder.record(Call::UpdateLoadBalancer(
            instance_id.to_string(),
            zone_id.to_string(),
            lb_id.to_string(),
            body.clone(),
        ))?;
        let mut lbs = self.load_balancers.lock().unwrap();
        let (_, _, lb) = lbs
            .iter_mut()
            .find(|(inst, zone, lb)| inst == instance_id && zone == zone_id && lb.id == lb_id)
            .ok_or_else(|| Self::missing("load balancer", lb_id))?;
        merge_load_balancer(lb, body);
        Ok(lb.clone())
    }

    async fn delete_load_balancer(
        &self,
        instance_id: &str,
        zone_id: &str,
        lb_id: &str,
    ) -> Result<(), ApiError> {
        self.recorder.record(Call::DeleteLoadBalancer(
            instance_id.to_string(),
            zone_id.to_string(),
            lb_id.to_string(),
        ))?;
        let mut lbs = self.load_balancers.lock().unwrap();
        let before = lbs.len();
        lbs.retain(|(inst, zone, lb)| !(inst == instance_id && zone == zone_id && lb.id == lb_id));
        if lbs.len() == before {
            return Err(Self::missing("load balancer", lb_id));
        }
        Ok(())
    }

    async fn list_load_balancers(
        &self,
        instance_id: &str,
        zone_id: &str,
        page_options: &PageOptions,
    ) -> Result<LoadBalancerList, ApiError> {
        self.recorder.record(Call::ListLoadBalancers(
            instance_id.to_string(),
            zone_id.to_string(),
            *page_options,
        ))?;
        let all: Vec<LoadBalancer> = self
            .load_balancers
            .lock()
            .unwrap()
            .iter()
            .filter(|(inst, zone, _)| inst == instance_id && zone == zone_id)
            .map(|(_, _, lb)| lb.clone())
            .collect();
        let (load_balancers, total) = page(&all, page_options);
        Ok(LoadBalancerList {
            count: Some(load_balancers.len() as i64),
            load_balancers,
            offset: page_options.offset,
            limit: page_options.limit,
            total_count: Some(total),
        })
    }
}

#[derive(Default)]
pub struct FakeVpc {
    recorder: Recorder,
    pub gateways: Mutex<Vec<VpnGateway>>,
    /// Page size used when a list call carries no limit
    pub page_size: Mutex<Option<usize>>,
}

impl FakeVpc {
    pub fn calls(&self) -> Vec<Call> {
        self.recorder.calls.lock().unwrap().clone()
    }

    pub fn fail_next(&self, err: ApiError) {
        *self.recorder.fail_next.lock().unwrap() = Some(err);
    }

    pub fn insert_gateway(&self, gateway: VpnGateway) {
        self.gateways.lock().unwrap().push(gateway);
    }
}

/// A gateway as the VPC API would describe it
pub fn sample_gateway(id: &str, mode: &str, resource_group: &str) -> VpnGateway {
    VpnGateway {
        id: id.to_string(),
        name: Some(format!("{}-name", id)),
        created_at: Some(CREATED.to_string()),
        crn: Some(format!("crn:v1:bluemix:public:is:us-south:a/acct::vpn:{}", id)),
        href: None,
        members: vec![
            VpnGatewayMember {
                public_ip: Some(PublicIp {
                    address: "169.61.1.1".to_string(),
                }),
                role: Some("active".to_string()),
                status: Some("available".to_string()),
            },
            VpnGatewayMember {
                public_ip: None,
                role: Some("standby".to_string()),
                status: Some("pending".to_string()),
            },
        ],
        mode: Some(mode.to_string()),
        resource_group: Some(Reference::new(resource_group)),
        resource_type: Some("vpn_gateway".to_string()),
        status: Some("available".to_string()),
        subnet: Some(Reference::new("subnet-1")),
    }
}

#[async_trait]
impl VpcApi for FakeVpc {
    async fn list_vpn_gateways(
        &self,
        options: &ListVpnGatewaysOptions,
    ) -> Result<VpnGatewayCollection, ApiError> {
        self.recorder.record(Call::ListVpnGateways(options.clone()))?;
        let filtered: Vec<VpnGateway> = self
            .gateways
            .lock()
            .unwrap()
            .iter()
            .filter(|gw| {
                options
                    .mode
                    .as_ref()
                    .map_or(true, |mode| gw.mode.as_ref() == Some(mode))
            })
            .filter(|gw| {
                options.resource_group_id.as_ref().map_or(true, |rg| {
                    gw.resource_group.as_ref().map(|r| &r.id) == Some(rg)
                })
            })
            .cloned()
            .collect();

        let start = match &options.start {
            Some(token) => filtered
                .iter()
                .position(|gw| &gw.id == token)
                .unwrap_or(filtered.len()),
            None => 0,
        };
        let limit = options
            .limit
            .map(|l| l.max(1) as usize)
            .or(*self.page_size.lock().unwrap())
            .unwrap_or(50);
        let vpn_gateways: Vec<VpnGateway> =
            filtered.iter().skip(start).take(limit).cloned().collect();
        let next = filtered.get(start + limit).map(|gw| PageLink {
            href: format!("https://fake.iaas/v1/vpn_gateways?limit={}&start={}", limit, gw.id),
        });

        Ok(VpnGatewayCollection {
            vpn_gateways,
            limit: Some(limit as i64),
            first: None,
            next,
        })
    }

    async fn create_vpn_gateway(
        &self,
        prototype: &VpnGatewayPrototype,
    ) -> Result<VpnGateway, ApiError> {
        self.recorder
            .record(Call::CreateVpnGateway(prototype.clone()))?;
        let id = self.recorder.new_id("r006-gw");
        let mut gateway = sample_gateway(
            &id,
            prototype.mode.as_deref().unwrap_or("route"),
            prototype
                .resource_group
                .as_ref()
                .map(|r| r.id.as_str())
                .unwrap_or("default-rg"),
        );
        gateway.name = prototype.name.clone();
        gateway.subnet = Some(prototype.subnet.clone());
        gateway.status = Some("pending".to_string());
        self.insert_gateway(gateway.clone());
        Ok(gateway)
    }

    async fn get_vpn_gateway(&self, id: &str) -> Result<VpnGateway, ApiError> {
        self.recorder.record(Call::GetVpnGateway(id.to_string()))?;
        self.gateways
            .lock()
            .unwrap()
            .iter()
            .find(|gw| gw.id == id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("vpn gateway {} not found", id)))
    }

    async fn update_vpn_gateway(
        &self,
        id: &str,
        patch: &VpnGatewayPatch,
    ) -> Result<VpnGateway, ApiError> {
        self.recorder
            .record(Call::UpdateVpnGateway(id.to_string(), patch.clone()))?;
        let mut gateways = self.gateways.lock().unwrap();
        let gateway = gateways
            .iter_mut()
            .find(|gw| gw.id == id)
            .ok_or_else(|| ApiError::not_found(format!("vpn gateway {} not found", id)))?;
        if patch.name.is_some() {
            gateway.name = patch.name.clone();
        }
        Ok(gateway.clone())
    }

    async fn delete_vpn_gateway(&self, id: &str) -> Result<(), ApiError> {
        self.recorder.record(Call::DeleteVpnGateway(id.to_string()))?;
        let mut gateways = self.gateways.lock().unwrap();
        let before = gateways.len();
        gateways.retain(|gw| gw.id != id);
        if gateways.len() == before {
            return Err(ApiError::not_found(format!("vpn gateway {} not found", id)));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeCr {
    recorder: Recorder,
    pub namespaces: Mutex<Vec<NamespaceDetails>>,
}

impl FakeCr {
    pub fn calls(&self) -> Vec<Call> {
        self.recorder.calls.lock().unwrap().clone()
    }

    pub fn fail_next(&self, err: ApiError) {
        *self.recorder.fail_next.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl ContainerRegistryApi for FakeCr {
    async fn list_namespace_details(&self) -> Result<Vec<NamespaceDetails>, ApiError> {
        self.recorder.record(Call::ListNamespaces)?;
        Ok(self.namespaces.lock().unwrap().clone())
    }

    async fn create_namespace(
        &self,
        name: &str,
        resource_group_id: Option<&str>,
    ) -> Result<(), ApiError> {
        self.recorder.record(Call::CreateNamespace(
            name.to_string(),
            resource_group_id.map(str::to_string),
        ))?;
        self.namespaces.lock().unwrap().push(NamespaceDetails {
            name: name.to_string(),
            account: Some("acct-1".to_string()),
            crn: Some(format!("crn:v1:bluemix:public:container-registry:us-south:a/acct-1::namespace:{}", name)),
            resource_group: Some(resource_group_id.unwrap_or("default-rg").to_string()),
            created_date: Some(CREATED.to_string()),
            updated_date: Some(CREATED.to_string()),
        });
        Ok(())
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), ApiError> {
        self.recorder
            .record(Call::DeleteNamespace(name.to_string()))?;
        let mut namespaces = self.namespaces.lock().unwrap();
        let before = namespaces.len();
        namespaces.retain(|ns| ns.name != name);
        if namespaces.len() == before {
            return Err(ApiError::not_found(format!("namespace {} not found", name)));
        }
        Ok(())
    }
}

/// Session handing out the fakes; `broken` simulates client construction failure
#[derive(Default)]
pub struct FakeSession {
    pub dns: FakeDns,
    pub vpc: FakeVpc,
    pub cr: FakeCr,
    pub broken: bool,
}

impl FakeSession {
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }

    fn check(&self) -> Result<()> {
        if self.broken {
            return Err(ProviderError::Session("session unavailable".to_string()));
        }
        Ok(())
    }
}

impl ClientSession for FakeSession {
    fn private_dns(&self) -> Result<&dyn DnsSvcsApi> {
        self.check()?;
        Ok(&self.dns)
    }

    fn vpc(&self) -> Result<&dyn VpcApi> {
        self.check()?;
        Ok(&self.vpc)
    }

    fn container_registry(&self) -> Result<&dyn ContainerRegistryApi> {
        self.check()?;
        Ok(&self.cr)
    }
}
