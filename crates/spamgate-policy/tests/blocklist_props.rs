use proptest::prelude::*;
use spamgate_policy::IpMatcher;
use std::net::Ipv4Addr;

proptest! {
    #[test]
    fn prop_range_blocks_exactly_its_hosts(a in any::<u8>(), b in any::<u8>(), c in any::<u8>(), host in any::<u8>(), other in any::<u8>()) {
        let matcher = IpMatcher::new();
        let range = format!("{}.{}.{}.0/24", a, b, c);
        prop_assert!(matcher.add_range(&range));

        let inside = Ipv4Addr::new(a, b, c, host).to_string();
        prop_assert!(matcher.check(&inside).blocked);

        let outside = Ipv4Addr::new(a, b, c.wrapping_add(1 + other % 255), host).to_string();
        prop_assert!(!matcher.check(&outside).blocked);
    }

    #[test]
    fn prop_block_then_unblock(octets in any::<[u8; 4]>()) {
        let matcher = IpMatcher::new();
        let ip = Ipv4Addr::from(octets).to_string();

        prop_assert!(matcher.add_address(&ip));
        prop_assert!(matcher.check(&ip).blocked);
        prop_assert!(matcher.remove_address(&ip));
        prop_assert!(!matcher.check(&ip).blocked);
    }

    #[test]
    fn prop_prefix_bounds(prefix in 0u32..200) {
        let v4 = format!("10.0.0.0/{}", prefix);
        let v6 = format!("2001:db8:0:0:0:0:0:0/{}", prefix);

        prop_assert_eq!(IpMatcher::validate_range(&v4), prefix <= 32);
        prop_assert_eq!(IpMatcher::validate_range(&v6), prefix <= 128);
    }

    #[test]
    fn prop_check_never_panics(input in "\\PC{0,40}") {
        let matcher = IpMatcher::new();
        matcher.add_range("0.0.0.0/0");
        let _ = matcher.check(&input);
    }
}
