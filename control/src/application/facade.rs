//! Fleet operations.
//!
//! Every method is a named `module.function` call with a fixed argument
//! shape, forwarded unchanged to [`Dispatcher::dispatch`]. The method table is
//! declared once in `fleet_operations!`, which also emits [`OPERATIONS`], the
//! catalogue used by callers that select operations by name.

use std::collections::BTreeMap;

use salt_common::{CommandEnvelope, CommandResult, DEFAULT_TARGET};
use serde_json::Value;

use crate::application::ports::Dispatcher;
use crate::domain::SaltError;

/// One facade method and the remote function it calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// Rust method name on [`Fleet`].
    pub name: &'static str,
    /// Salt `module.function`.
    pub function: &'static str,
    /// Parameter names after `target`, in call order.
    pub params: &'static [&'static str],
}

impl Operation {
    /// Look up an operation by method name.
    #[must_use]
    pub fn find(name: &str) -> Option<&'static Operation> {
        OPERATIONS.iter().find(|op| op.name == name)
    }
}

/// Conversion of facade parameters into positional `arg` strings.
pub trait IntoArgs {
    fn push_args(self, out: &mut Vec<String>);
}

impl IntoArgs for &str {
    fn push_args(self, out: &mut Vec<String>) {
        out.push(self.to_string());
    }
}

impl IntoArgs for String {
    fn push_args(self, out: &mut Vec<String>) {
        out.push(self);
    }
}

impl IntoArgs for u32 {
    fn push_args(self, out: &mut Vec<String>) {
        out.push(self.to_string());
    }
}

impl IntoArgs for &[&str] {
    fn push_args(self, out: &mut Vec<String>) {
        out.extend(self.iter().map(|s| (*s).to_string()));
    }
}

/// Typed operations over a fleet of minions.
pub struct Fleet<D> {
    dispatcher: D,
}

impl<D: Dispatcher> Fleet<D> {
    #[must_use]
    pub fn new(dispatcher: D) -> Self {
        Self { dispatcher }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Send a prepared envelope.
    ///
    /// # Errors
    ///
    /// Propagates the dispatcher's `SaltError`.
    pub async fn dispatch(&self, envelope: CommandEnvelope) -> Result<CommandResult, SaltError> {
        self.dispatcher.dispatch(envelope).await
    }

    /// Call `function` on `target` with positional `args`.
    ///
    /// # Errors
    ///
    /// Propagates the dispatcher's `SaltError`.
    pub async fn call(
        &self,
        target: &str,
        function: &str,
        args: Vec<String>,
    ) -> Result<CommandResult, SaltError> {
        let envelope = CommandEnvelope::new(target, function).with_args(args);
        self.dispatcher.dispatch(envelope).await
    }

    /// `test.ping` the target. Minions that did not answer are absent; a
    /// non-`true` reply maps to `false`.
    ///
    /// # Errors
    ///
    /// Propagates the dispatcher's `SaltError`.
    pub async fn ping(&self, target: &str) -> Result<BTreeMap<String, bool>, SaltError> {
        let result = self.call(target, "test.ping", Vec::new()).await?;
        Ok(result
            .into_minions()
            .into_iter()
            .map(|(minion, reply)| (minion, reply == Value::Bool(true)))
            .collect())
    }

    /// Ids of every minion that answers a ping, sorted.
    ///
    /// # Errors
    ///
    /// Propagates the dispatcher's `SaltError`.
    pub async fn list_minions(&self) -> Result<Vec<String>, SaltError> {
        let result = self.call(DEFAULT_TARGET, "test.ping", Vec::new()).await?;
        Ok(result.targets().map(str::to_string).collect())
    }
}

macro_rules! fleet_operations {
    ($(
        $(#[$meta:meta])*
        fn $name:ident($($param:ident: $ty:ty),*) => $fun:literal [$($arg:expr),*];
    )*) => {
        impl<D: Dispatcher> Fleet<D> {
            $(
                $(#[$meta])*
                ///
                /// # Errors
                ///
                /// Propagates the dispatcher's `SaltError`.
                pub async fn $name(
                    &self,
                    target: &str
                    $(, $param: $ty)*
                ) -> Result<CommandResult, SaltError> {
                    #[allow(unused_mut)]
                    let mut args: Vec<String> = Vec::new();
                    $( IntoArgs::push_args($arg, &mut args); )*
                    self.call(target, $fun, args).await
                }
            )*
        }

        /// Every table-generated operation, in declaration order.
        pub const OPERATIONS: &[Operation] = &[
            $(
                Operation {
                    name: stringify!($name),
                    function: $fun,
                    params: &[$(stringify!($param)),*],
                },
            )*
        ];
    };
}

fleet_operations! {
    // ── Shell & state ────────────────────────────────────────────────────────
    /// Run a shell command through `cmd.run`.
    fn run_shell(command: &str) => "cmd.run" [command];
    fn grains() => "grains.items" [];
    fn apply_state(state: &str) => "state.apply" [state];
    fn highstate() => "state.highstate" [];

    // ── Packages ─────────────────────────────────────────────────────────────
    fn package_install(packages: &[&str]) => "pkg.install" [packages];
    fn package_remove(packages: &[&str]) => "pkg.remove" [packages];
    /// Upgrade the named packages, or everything when `packages` is empty.
    fn package_upgrade(packages: &[&str]) => "pkg.upgrade" [packages];
    fn package_list() => "pkg.list_pkgs" [];
    fn package_available(package: &str) => "pkg.available_version" [package];

    // ── Services ─────────────────────────────────────────────────────────────
    fn service_start(service: &str) => "service.start" [service];
    fn service_stop(service: &str) => "service.stop" [service];
    fn service_restart(service: &str) => "service.restart" [service];
    fn service_status(service: &str) => "service.status" [service];
    fn service_enable(service: &str) => "service.enable" [service];
    fn service_disable(service: &str) => "service.disable" [service];
    fn service_list() => "service.get_all" [];

    // ── Files ────────────────────────────────────────────────────────────────
    /// Read a file from the master file server as a string.
    fn file_read(path: &str) => "cp.get_file_str" [path];
    fn file_write(path: &str, content: &str) => "file.write" [path, content];
    fn file_remove(path: &str) => "file.remove" [path];
    fn file_exists(path: &str) => "file.file_exists" [path];
    fn file_copy(source: &str, dest: &str) => "file.copy" [source, dest];
    fn file_chmod(path: &str, mode: &str) => "file.set_mode" [path, mode];
    fn file_chown(path: &str, user: &str, group: &str) => "file.chown" [path, user, group];

    // ── Users & groups ───────────────────────────────────────────────────────
    fn user_add(username: &str) => "user.add" [username];
    fn user_delete(username: &str) => "user.delete" [username];
    fn user_list() => "user.list_users" [];
    fn user_info(username: &str) => "user.info" [username];
    fn group_add(group: &str) => "group.add" [group];
    fn group_delete(group: &str) => "group.delete" [group];

    // ── System ───────────────────────────────────────────────────────────────
    fn system_reboot() => "system.reboot" [];
    fn system_shutdown() => "system.shutdown" [];
    fn system_uptime() => "status.uptime" [];
    fn disk_usage() => "disk.usage" [];
    fn memory_usage() => "status.meminfo" [];
    fn cpu_info() => "status.cpuinfo" [];
    fn network_interfaces() => "network.interfaces" [];
    fn load_average() => "status.loadavg" [];
    fn disk_io_stats() => "disk.iostat" [];
    fn network_io_stats() => "status.netstats" [];
    fn system_time() => "system.get_system_time" [];
    fn timezone() => "timezone.get_zone" [];
    fn hostname() => "network.get_hostname" [];
    fn kernel_version() => "system.get_kernel" [];
    /// The `osrelease` grain.
    fn os_version() => "grains.get" ["osrelease"];
    fn system_info() => "status.all_status" [];

    // ── Jobs & schedules ─────────────────────────────────────────────────────
    fn jobs_list() => "saltutil.find_job" [];
    fn job_kill(jid: &str) => "saltutil.kill_job" [jid];
    fn sync_all() => "saltutil.sync_all" [];
    fn schedule_list() => "schedule.list" [];

    // ── Docker ───────────────────────────────────────────────────────────────
    fn docker_ps() => "docker.ps" [];
    fn docker_start(container: &str) => "docker.start" [container];
    fn docker_stop(container: &str) => "docker.stop" [container];
    fn docker_restart(container: &str) => "docker.restart" [container];

    // ── Git ──────────────────────────────────────────────────────────────────
    /// Clone `repo` into `dest`. `git.clone` takes the working directory first.
    fn git_clone(repo: &str, dest: &str) => "git.clone" [dest, repo];
    fn git_pull(repo: &str) => "git.pull" [repo];

    // ── Network ──────────────────────────────────────────────────────────────
    fn network_ping(host: &str, count: u32) => "network.ping" [host, count];
    fn network_traceroute(host: &str) => "network.traceroute" [host];
    fn network_netstat() => "network.netstat" [];
    fn network_active_connections() => "network.active_tcp" [];
    fn network_default_route() => "network.default_route" [];
    fn network_routes() => "network.routes" [];
    fn network_arp() => "network.arp" [];

    // ── Processes ────────────────────────────────────────────────────────────
    /// Every process (`ps.pgrep .*`).
    fn process_list() => "ps.pgrep" [".*"];
    fn process_top() => "ps.top" [];
    fn process_kill(pid: &str, signal: &str) => "ps.kill_pid" [pid, signal];
    fn process_info(pid: &str) => "ps.proc_info" [pid];

    // ── Cron ─────────────────────────────────────────────────────────────────
    fn cron_list(user: &str) => "cron.list_tab" [user];
    fn cron_add(
        user: &str,
        minute: &str,
        hour: &str,
        daymonth: &str,
        month: &str,
        dayweek: &str,
        command: &str
    ) => "cron.set_job" [user, minute, hour, daymonth, month, dayweek, command];
    fn cron_remove(user: &str, command: &str) => "cron.rm_job" [user, command];

    // ── Archives ─────────────────────────────────────────────────────────────
    /// Gzip-compressed tarball of `source` written to `dest`.
    fn archive_tar(source: &str, dest: &str) => "archive.tar" ["czf", dest, source];
    fn archive_untar(source: &str, dest: &str) => "archive.tar" ["xzf", source, "-C", dest];
    fn archive_zip(source: &str, dest: &str) => "archive.zip" [dest, source];
    fn archive_unzip(source: &str, dest: &str) => "archive.unzip" [source, dest];

    // ── Firewall & mounts ────────────────────────────────────────────────────
    fn firewall_list() => "firewalld.list_all" [];
    fn firewall_add_rule(port: &str, protocol: &str) => "firewalld.add_port" [port, protocol];
    fn firewall_remove_rule(port: &str, protocol: &str) => "firewalld.remove_port" [port, protocol];
    fn mount_list() => "mount.active" [];
    fn mount(device: &str, mountpoint: &str, fstype: &str) => "mount.mount" [mountpoint, device, fstype];
    fn unmount(mountpoint: &str) => "mount.umount" [mountpoint];

    // ── SSH keys ─────────────────────────────────────────────────────────────
    fn ssh_key_gen(user: &str, key_type: &str) => "ssh.key_gen" [user, key_type];
    fn ssh_auth_keys(user: &str) => "ssh.auth_keys" [user];
    fn ssh_set_auth_key(user: &str, key: &str) => "ssh.set_auth_key" [user, key];

    // ── Environment, HTTP & introspection ────────────────────────────────────
    fn env_get(key: &str) => "environ.get" [key];
    fn env_set(key: &str, value: &str) => "environ.setval" [key, value];
    fn env_list() => "environ.items" [];
    /// Issue an HTTP request from the minion.
    fn http_query(url: &str, method: &str) => "http.query" [url, format!("method={method}")];
    fn modules_list() => "sys.list_modules" [];
    fn functions_list() => "sys.list_functions" [];

    // ── Grains & pillar ──────────────────────────────────────────────────────
    fn grain_set(key: &str, value: &str) => "grains.setval" [key, value];
    fn grain_get(key: &str) => "grains.get" [key];
    fn grain_delete(key: &str) => "grains.delval" [key];
    fn pillar_get(key: &str) => "pillar.get" [key];
    fn pillar_items() => "pillar.items" [];

    // ── Kubernetes (through cmd.run on a control-plane minion) ───────────────
    fn kubectl_get(resource: &str) => "cmd.run" [format!("kubectl get {resource}")];
    fn kubectl_apply(manifest: &str) => "cmd.run" [format!("kubectl apply -f {manifest}")];
    fn kubectl_delete(resource: &str, name: &str) => "cmd.run" [format!("kubectl delete {resource} {name}")];
}
