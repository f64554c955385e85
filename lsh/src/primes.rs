//! Prime helpers for sizing the universal hash domain.

/// Checks if `n` is prime by trial division.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut d = 5u64;
    while d * d <= n {
        if n % d == 0 || n % (d + 2) == 0 {
            return false;
        }
        d += 6;
    }
    true
}

/// Gets the smallest prime that is not less than `n`.
///
/// # Examples
///
/// ```
/// use lsh::primes::least_prime_at_least;
///
/// assert_eq!(least_prime_at_least(1000), 1009);
/// assert_eq!(least_prime_at_least(1009), 1009);
/// ```
pub fn least_prime_at_least(n: u64) -> u64 {
    if n <= 2 {
        return 2;
    }
    let mut p = if n % 2 == 0 { n + 1 } else { n };
    while !is_prime(p) {
        p += 2;
    }
    p
}
