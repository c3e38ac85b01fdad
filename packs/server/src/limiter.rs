use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

const WINDOW: Duration = Duration::from_secs(1);

/// Per client address request limiter over a sliding one second window.
pub struct RateLimiter {
    enabled: bool,
    max_requests: usize,
    requests: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(enabled: bool, max_requests: u32) -> RateLimiter {
        RateLimiter {
            enabled,
            max_requests: max_requests as usize,
            requests: Mutex::new(HashMap::new()),
        }
    }

    pub fn disabled() -> RateLimiter {
        RateLimiter::new(false, 0)
    }

    /// Records a request from `ip`, returning false if it is over the limit.
    /// Rejected requests are not recorded.
    pub async fn check(&self, ip: IpAddr) -> bool {
        self.check_at(ip, Instant::now()).await
    }

    async fn check_at(&self, ip: IpAddr, now: Instant) -> bool {
        if !self.enabled {
            return true;
        }
        let mut requests = self.requests.lock().await;
        let times = requests.entry(ip).or_default();
        expire(times, now);
        if times.len() >= self.max_requests {
            return false;
        }
        times.push_back(now);
        true
    }

    /// Drops addresses with no request inside the window.
    pub async fn sweep(&self) {
        self.sweep_at(Instant::now()).await
    }

    async fn sweep_at(&self, now: Instant) {
        let mut requests = self.requests.lock().await;
        requests.retain(|_, times| {
            expire(times, now);
            !times.is_empty()
        });
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.requests.lock().await.len()
    }
}

// times are pushed in order, so expired entries are always at the front
fn expire(times: &mut VecDeque<Instant>, now: Instant) {
    while let Some(&oldest) = times.front() {
        if now.duration_since(oldest) < WINDOW {
            break;
        }
        times.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    const A: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
    const B: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

    #[tokio::test]
    async fn test_limit_per_address() {
        let limiter = RateLimiter::new(true, 2);
        let start = Instant::now();

        assert!(limiter.check_at(A, start).await);
        assert!(limiter.check_at(A, start + Duration::from_millis(100)).await);
        assert!(!limiter.check_at(A, start + Duration::from_millis(200)).await);
        // other addresses are counted separately
        assert!(limiter.check_at(B, start + Duration::from_millis(200)).await);

        // the first request leaves the window after a second
        assert!(limiter.check_at(A, start + Duration::from_millis(1000)).await);
        assert!(!limiter.check_at(A, start + Duration::from_millis(1050)).await);
    }

    #[tokio::test]
    async fn test_disabled_always_admits() {
        let limiter = RateLimiter::disabled();
        let now = Instant::now();
        for _ in 0..100 {
            assert!(limiter.check_at(A, now).await);
        }
        assert_eq!(0, limiter.tracked().await);
    }

    #[tokio::test]
    async fn test_sweep_drops_idle_addresses() {
        let limiter = RateLimiter::new(true, 5);
        let start = Instant::now();
        limiter.check_at(A, start).await;
        limiter.check_at(B, start + Duration::from_millis(800)).await;
        assert_eq!(2, limiter.tracked().await);

        limiter.sweep_at(start + Duration::from_millis(1500)).await;
        assert_eq!(1, limiter.tracked().await);

        limiter.sweep_at(start + Duration::from_secs(2)).await;
        assert_eq!(0, limiter.tracked().await);
    }
}
