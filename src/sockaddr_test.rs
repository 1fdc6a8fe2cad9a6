use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV6};

use bytes::BytesMut;

use crate::address::{AddressFamily, NetworkAddress, NetworkMask};
use crate::errors::{Error, ErrorCode};
use crate::sockaddr::*;
use crate::wire::{WORD, WireBuilder, align_word};

fn encode(sockaddr: &SockAddr) -> Vec<u8> {
    let mut buf = BytesMut::new();
    sockaddr.encode(&mut buf);
    buf.to_vec()
}

#[test]
fn sockaddr_in_layout() {
    let sockaddr = SockAddr::from_socket_addr("192.0.2.1:8080".parse().unwrap());
    assert_eq!(encode(&sockaddr), [16, AF_INET, 0x1f, 0x90, 192, 0, 2, 1, 0, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(sockaddr.port(), 8080);
    assert_eq!(sockaddr.sa_len(), SOCKADDR_IN_LEN);
}

#[test]
fn sockaddr_in6_layout() {
    let addr = "2001:db8::1".parse::<Ipv6Addr>().unwrap();
    let sockaddr = SockAddr::from_socket_addr(SocketAddr::V6(SocketAddrV6::new(addr, 443, 0x0001_2345, 7)));
    let image = encode(&sockaddr);
    assert_eq!(image.len(), SOCKADDR_IN6_LEN);
    assert_eq!(&image[..8], &[28, AF_INET6, 0x01, 0xbb, 0x00, 0x01, 0x23, 0x45]);
    assert_eq!(&image[8..24], &addr.octets());
    assert_eq!(&image[24..], &7u32.to_ne_bytes());

    assert_eq!(SockAddr::parse(&image).unwrap(), sockaddr);
}

#[test]
fn addresses_and_masks() {
    let sockaddr = SockAddr::from_address(NetworkAddress::V4(Ipv4Addr::new(10, 1, 2, 3)));
    assert_eq!(sockaddr.to_text().unwrap(), "10.1.2.3");
    assert_eq!(sockaddr.port(), 0);
    assert_eq!(sockaddr.family(), AddressFamily::Inet.sa_family());

    let mask = NetworkMask::from_prefix_len(AddressFamily::Inet6, 56).unwrap();
    let sockaddr = SockAddr::from_mask(&mask);
    assert_eq!(sockaddr.sa_len(), AddressFamily::Inet6.sockaddr_len());
    assert_eq!(sockaddr.to_text().unwrap(), "ffff:ffff:ffff:ff00::");
    assert_eq!(sockaddr.to_address().map(|address| address.family()), Some(AddressFamily::Inet6));
}

#[test]
fn foreign_families() {
    // AF_LINK image with a made-up payload
    let image = [8, 18, 1, 2, 3, 4, 5, 6];
    let sockaddr = SockAddr::parse(&image).unwrap();
    assert_eq!(sockaddr, SockAddr::Other { family: 18, data: vec![1, 2, 3, 4, 5, 6] });
    assert_eq!(sockaddr.sa_len(), 8);
    assert_eq!(sockaddr.port(), 0);
    assert_eq!(sockaddr.to_address(), None);
    assert_eq!(encode(&sockaddr), image);

    let error = sockaddr.to_text().unwrap_err();
    assert!(matches!(error, Error::UnsupportedFamily { family: 18 }));
    assert_eq!(error.code(), ErrorCode::UnsupportedFamily);
}

#[test]
fn malformed_images() {
    assert_eq!(SockAddr::parse(&[]), Err(SockAddrParseError::MissingHeader));
    assert_eq!(SockAddr::parse(&[16]), Err(SockAddrParseError::MissingHeader));
    assert_eq!(SockAddr::parse(&[1, AF_INET, 0, 0]), Err(SockAddrParseError::MissingHeader));
    assert_eq!(SockAddr::parse(&[16, AF_INET, 0, 0]), Err(SockAddrParseError::Truncated { declared: 16, available: 4 }));
    let oversized = [32, AF_INET6, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    assert_eq!(
        SockAddr::parse(&oversized),
        Err(SockAddrParseError::BadLength { family: AF_INET6, declared: 32, expected: SOCKADDR_IN6_LEN })
    );
}

#[test]
fn short_images_are_zero_filled() {
    let sockaddr = SockAddr::parse(&[12, AF_INET6, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff]).unwrap();
    assert_eq!(sockaddr.to_text().unwrap(), "ffff:ffff::");
    assert_eq!(sockaddr.sa_len(), SOCKADDR_IN6_LEN);

    let sockaddr = SockAddr::parse(&[7, AF_INET, 0, 0, 255, 255, 255]).unwrap();
    assert_eq!(sockaddr.to_text().unwrap(), "255.255.255.0");
}

#[test]
fn kernel_netmasks() {
    assert_eq!(SockAddr::parse_mask(&[], AddressFamily::Inet6).unwrap().prefix_len(), 0);
    // sa_len 0 with leftover bytes behind it
    assert_eq!(SockAddr::parse_mask(&[0, 0, 0xff, 0xff], AddressFamily::Inet6).unwrap().prefix_len(), 0);
    assert_eq!(SockAddr::parse_mask(&[0, AF_INET], AddressFamily::Inet).unwrap().prefix_len(), 0);

    // trimmed after the last non-zero octet, family left unset
    let mask = SockAddr::parse_mask(&[12, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff], AddressFamily::Inet6).unwrap();
    assert_eq!(mask.prefix_len(), 32);
    assert_eq!(mask.family(), AddressFamily::Inet6);
    let mask = SockAddr::parse_mask(&[7, 0, 0, 0, 255, 255, 240], AddressFamily::Inet).unwrap();
    assert_eq!(mask.prefix_len(), 20);
    assert_eq!(mask.to_string(), "255.255.240.0");
    // header only
    assert_eq!(SockAddr::parse_mask(&[5, 0, 0, 0, 0], AddressFamily::Inet).unwrap().prefix_len(), 0);

    let full = NetworkMask::from_prefix_len(AddressFamily::Inet6, 48).unwrap();
    assert_eq!(SockAddr::parse_mask(&encode(&SockAddr::from_mask(&full)), AddressFamily::Inet6).unwrap(), full);

    assert_eq!(
        SockAddr::parse_mask(&[12, 0, 0, 0], AddressFamily::Inet6),
        Err(SockAddrParseError::Truncated { declared: 12, available: 4 })
    );
    assert_eq!(
        SockAddr::parse_mask(&[20; 20], AddressFamily::Inet),
        Err(SockAddrParseError::BadLength { family: AF_INET, declared: 20, expected: SOCKADDR_IN_LEN })
    );
}

#[test]
fn trailing_padding_is_ignored() {
    let sockaddr = SockAddr::from_address(NetworkAddress::from_text("fe80::1").unwrap());
    let mut builder = WireBuilder::with_capacity(64);
    builder.put_sockaddr_aligned(&sockaddr);
    builder.put_sockaddr_aligned(&sockaddr);
    let bytes = builder.finish();
    assert_eq!(bytes.len(), 2 * align_word(SOCKADDR_IN6_LEN));
    assert_eq!(SockAddr::parse(&bytes).unwrap(), sockaddr);
    assert_eq!(SockAddr::parse(&bytes[align_word(SOCKADDR_IN6_LEN)..]).unwrap(), sockaddr);
}

#[test]
fn word_alignment() {
    assert_eq!(align_word(0), WORD);
    assert_eq!(align_word(1), WORD);
    assert_eq!(align_word(WORD), WORD);
    assert_eq!(align_word(WORD + 1), 2 * WORD);
    assert_eq!(align_word(SOCKADDR_IN_LEN), 16);
    #[cfg(target_pointer_width = "64")]
    assert_eq!(align_word(SOCKADDR_IN6_LEN), 32);
}

#[test]
fn builder_patches_length() {
    let mut builder = WireBuilder::with_capacity(8);
    assert!(builder.is_empty());
    builder.put_u16(0);
    builder.put_name("ab", 4);
    builder.align_to(8);
    let len = builder.len() as u16;
    builder.set_u16(0, len);
    let bytes = builder.finish();
    assert_eq!(&bytes[..], &[8u16.to_ne_bytes()[0], 8u16.to_ne_bytes()[1], b'a', b'b', 0, 0, 0, 0]);
}
