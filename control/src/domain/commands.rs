//! Shell snippets run on freshly provisioned hosts before a minion exists.
//!
//! Pure string builders. Arguments are interpolated as given; callers pass
//! trusted, already-validated values.

/// Install Docker from the distribution archive and start it.
pub const INSTALL_DOCKER: &str = "
apt-get update && apt-get install -y docker.io
systemctl enable docker
systemctl start docker
";

pub const INSTALL_WIREGUARD: &str = "apt-get update && apt-get install -y wireguard wireguard-tools";

/// Generate a WireGuard keypair under `/etc/wireguard` and print the public key.
pub const GENERATE_WIREGUARD_KEYS: &str = "
wg genkey | tee /etc/wireguard/private.key | wg pubkey > /etc/wireguard/public.key
chmod 600 /etc/wireguard/private.key
cat /etc/wireguard/public.key
";

pub const ENABLE_IP_FORWARDING: &str = "
echo 'net.ipv4.ip_forward=1' >> /etc/sysctl.conf
sysctl -p
";

pub const CHECK_DOCKER_STATUS: &str = "systemctl is-active docker";

pub const CHECK_WIREGUARD_STATUS: &str = "wg show";

/// Seconds between polls of the dpkg/apt lock files.
pub const APT_LOCK_POLL_SECS: u32 = 5;

/// Non-interactive `apt-get install` that first waits for unattended-upgrades
/// (or any other dpkg user) to release the package locks.
#[must_use]
pub fn apt_install(packages: &[&str]) -> String {
    let packages = packages.join(" ");
    format!(
        "
# wait for apt locks (unattended-upgrades holds them after boot)
while fuser /var/lib/dpkg/lock-frontend >/dev/null 2>&1 || fuser /var/lib/apt/lists/lock >/dev/null 2>&1; do
  echo \"Waiting for apt locks to be released...\"
  sleep {APT_LOCK_POLL_SECS}
done

apt-get update -y
DEBIAN_FRONTEND=noninteractive apt-get install -y {packages}"
    )
}

#[must_use]
pub fn systemd_enable_start(service: &str) -> String {
    format!("systemctl enable {service} && systemctl start {service}")
}

/// Write `content` to `path` through a quoted heredoc, so `$`, backticks and
/// backslashes in the content are not expanded by the remote shell.
#[must_use]
pub fn file_write(path: &str, content: &str) -> String {
    format!("cat > {path} <<'EOF'\n{content}\nEOF")
}

#[must_use]
pub fn directory_create(path: &str, mode: &str) -> String {
    format!("mkdir -p {path} && chmod {mode} {path}")
}
