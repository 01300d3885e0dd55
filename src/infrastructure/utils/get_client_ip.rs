use actix_web::HttpRequest;

const UNKNOWN_CLIENT: &str = "unknown";

/// Key used to rate limit a client.
///
/// Behind a reverse proxy every request shares the proxy's peer address, so
/// `trust_proxy` switches to the address reported in `Forwarded` /
/// `X-Forwarded-For`. Leave it off when the service is exposed directly, the
/// headers are client controlled.
pub fn client_key(req: &HttpRequest, trust_proxy: bool) -> String {
    let conn = req.connection_info();

    let addr = if trust_proxy {
        conn.realip_remote_addr()
    } else {
        conn.peer_addr()
    };

    addr.map(strip_port)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

fn strip_port(addr: &str) -> &str {
    // [::1]:8080
    if let Some(rest) = addr.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    // 10.0.0.1:8080, but leave a bare IPv6 address alone
    match addr.rsplit_once(':') {
        Some((host, _)) if !host.contains(':') => host,
        _ => addr,
    }
}
